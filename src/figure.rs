use std::cell::{Cell, RefCell};
use std::f64::consts::PI;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::animation::callback::trigger_fn;
use crate::animation::step::AnimationStep;
use crate::animation::steps::color::{DISSOLVED, OpacityStep};
use crate::animation::steps::scenario::{ScenarioStep, ScenarioTarget, ScenarioVelocity};
use crate::element::movement::MoveConfig;
use crate::element::node::ElementId;
use crate::element::tree::ElementTree;
use crate::foundation::core::{CanvasSize, Point, Rect, Rgba, StopHow, When};
use crate::foundation::error::{FigureError, FigureResult};
use crate::notify::Notifications;
use crate::render::Renderer;
use crate::scheduler::global::GlobalAnimation;
use crate::state::{ElementState, FigureState};
use crate::transform::chain::Transform;

/// Name given to the animations a state transition starts.
pub const STATE_TRANSITION: &str = "stateTransition";

/// How [`Figure::set_state`] gets to the new state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateHow {
    #[default]
    Instant,
    /// Animate each element to its target.
    Animate,
    /// Fade out, jump, fade in.
    Dissolve,
}

/// Transition duration: one total, or explicit dissolve phases.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateDuration {
    Total(f64),
    Dissolve {
        out: f64,
        delay: f64,
        #[serde(rename = "in")]
        into: f64,
    },
}

impl StateDuration {
    /// Out, delay and in phases. A total splits 0.45 / 0.1 / 0.45.
    pub fn phases(self) -> [f64; 3] {
        match self {
            Self::Total(d) => [0.45 * d, 0.1 * d, 0.45 * d],
            Self::Dissolve { out, delay, into } => [out, delay, into],
        }
    }

    pub fn total(self) -> f64 {
        self.phases().iter().sum()
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SetStateOptions {
    pub how: StateHow,
    /// `None` animates by velocity; dissolves then use the default phases.
    pub duration: Option<StateDuration>,
    pub velocity: ScenarioVelocity,
    pub max_duration: f64,
    pub all_durations_same: bool,
    pub zero_duration_threshold: f64,
    /// Let a snapshot's own duration win over `duration`.
    pub prioritize_form_duration: bool,
}

impl Default for SetStateOptions {
    fn default() -> Self {
        Self {
            how: StateHow::Instant,
            duration: None,
            velocity: ScenarioVelocity {
                translation: Some(2.0),
                rotation: Some(PI),
                scale: Some(1.0),
                color: Some(0.8),
                opacity: Some(0.8),
            },
            max_duration: 6.0,
            all_durations_same: true,
            zero_duration_threshold: 0.00001,
            prioritize_form_duration: false,
        }
    }
}

impl SetStateOptions {
    pub fn animate() -> Self {
        Self {
            how: StateHow::Animate,
            ..Self::default()
        }
    }

    pub fn dissolve() -> Self {
        Self {
            how: StateHow::Dissolve,
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, duration: StateDuration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// The caller's duration, or the snapshot's when it takes priority or the caller gave none.
    pub fn resolve_duration(&self, form_duration: Option<f64>) -> Option<StateDuration> {
        let form = form_duration.map(StateDuration::Total);
        match (self.prioritize_form_duration, form, self.duration) {
            (true, Some(form), _) => Some(form),
            (_, _, Some(own)) => Some(own),
            (_, form, None) => form,
        }
    }
}

/// Figure-wide configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FigureOptions {
    /// Figure-space rectangle mapped onto the canvas, as `x, y, width, height`.
    #[serde(with = "crate::foundation::tagged::rect")]
    pub limits: Rect,
    pub canvas_size: CanvasSize,
    pub default_color: Rgba,
    pub dim_color: Rgba,
    pub move_defaults: MoveConfig,
    pub set_state_defaults: SetStateOptions,
    /// On touch, only the topmost touched element may be moved.
    pub move_top_element_only: bool,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            limits: Rect::new(-1.0, -1.0, 1.0, 1.0),
            canvas_size: CanvasSize::default(),
            default_color: Rgba::WHITE,
            dim_color: Rgba::DIM,
            move_defaults: MoveConfig::default(),
            set_state_defaults: SetStateOptions::default(),
            move_top_element_only: true,
        }
    }
}

impl FigureOptions {
    pub fn from_json(json: &str) -> FigureResult<Self> {
        serde_json::from_str(json).map_err(|e| FigureError::config(format!("figure options: {e}")))
    }
}

/// A state transition waiting for its animations to drain.
#[derive(Debug)]
struct Transition {
    target: Rc<FigureState>,
    /// Publish `stopped` when done; set by a dissolve-to-complete stop.
    publish_stopped: bool,
}

/// An element tree bound to a scheduler and a renderer.
///
/// Construct with [`Figure::new`]; the returned handle redraws itself through the scheduler
/// whenever the tree asks for it.
pub struct Figure {
    pub tree: ElementTree,
    pub options: FigureOptions,
    /// `stopped`, `preparingToStop`, `stateSet`, `afterDraw`, `touch`.
    pub notifications: Notifications,
    global: Rc<GlobalAnimation>,
    renderer: Box<dyn Renderer>,
    transition: Option<Transition>,
    stopping: bool,
    being_moved: Option<ElementId>,
}

impl std::fmt::Debug for Figure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Figure")
            .field("tree", &self.tree)
            .field("options", &self.options)
            .field("stopping", &self.stopping)
            .field("in_transition", &self.transition.is_some())
            .finish()
    }
}

impl Figure {
    pub fn new(
        options: FigureOptions,
        global: Rc<GlobalAnimation>,
        renderer: Box<dyn Renderer>,
    ) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|this: &Weak<RefCell<Self>>| {
            let mut tree = ElementTree::new(global.clone());
            tree.limits = options.limits;
            tree.canvas = options.canvas_size;
            tree.set_redraw_hook(redraw_hook(this.clone(), global.clone()));
            RefCell::new(Self {
                tree,
                options,
                notifications: Notifications::default(),
                global,
                renderer,
                transition: None,
                stopping: false,
                being_moved: None,
            })
        })
    }

    pub fn root(&self) -> ElementId {
        self.tree.root()
    }

    pub fn global(&self) -> &Rc<GlobalAnimation> {
        &self.global
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn now(&self) -> f64 {
        self.tree.now()
    }

    pub fn is_animating(&self) -> bool {
        self.tree.is_animating(self.root())
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    pub fn is_in_transition(&self) -> bool {
        self.transition.is_some()
    }

    /// Advance everything to `now` (seconds), then emit draw calls.
    #[tracing::instrument(skip(self))]
    pub fn draw(&mut self, now: f64) {
        let root = self.root();
        self.tree.setup_draw(root, now);
        self.tree.check_pending_stops(root);
        self.check_transition();
        self.check_stopped();
        self.renderer.begin_frame();
        self.tree
            .draw(root, &[Transform::new()], 1.0, self.renderer.as_mut());
        if self.tree.is_animating(root) {
            self.tree.request_redraw();
        }
        self.notifications.notify("afterDraw");
    }

    pub fn resize(&mut self, canvas: CanvasSize) {
        self.tree.canvas = canvas;
        self.options.canvas_size = canvas;
        self.renderer.resize();
        self.tree.request_redraw();
    }

    /// Stop every element.
    ///
    /// Publishes `stopped` straight away unless the stop has to drain, in which case
    /// `preparingToStop` goes out now and `stopped` once everything has finished.
    #[tracing::instrument(skip(self))]
    pub fn stop(&mut self, how: StopHow) {
        let root = self.root();
        if !self.is_animating() && self.transition.is_none() {
            self.stopping = false;
            self.notifications.notify("stopped");
            return;
        }
        match how {
            StopHow::AnimateToComplete => {
                self.tree.stop(root, how);
                self.tree.check_pending_stops(root);
                if self.tree.is_any_preparing_to_stop(root) || self.transition.is_some() {
                    if !self.stopping {
                        self.stopping = true;
                        self.notifications.notify("preparingToStop");
                    }
                } else {
                    self.notifications.notify("stopped");
                }
            }
            StopHow::DissolveToComplete => self.dissolve_to_complete(),
            StopHow::Complete => {
                self.tree.stop(root, how);
                if let Some(t) = self.transition.take() {
                    let now = self.now();
                    if let Err(err) = t.target.restore(&mut self.tree, now) {
                        tracing::warn!(%err, "could not complete state transition");
                    }
                }
                self.stopping = false;
                self.notifications.notify("stopped");
            }
            StopHow::Freeze | StopHow::Cancel => {
                self.tree.stop(root, how);
                self.transition = None;
                self.stopping = false;
                self.notifications.notify("stopped");
            }
        }
    }

    fn dissolve_to_complete(&mut self) {
        let root = self.root();
        let now = self.now();
        let snapshots = self.get_state().and_then(|current| {
            self.tree.stop(root, StopHow::Complete);
            Ok((current, self.get_state()?))
        });
        let (current, completed) = match snapshots {
            Ok(pair) => pair,
            Err(err) => {
                tracing::warn!(%err, "snapshot failed, completing instead");
                self.tree.stop(root, StopHow::Complete);
                self.notifications.notify("stopped");
                return;
            }
        };
        if let Err(err) = current.restore(&mut self.tree, now) {
            tracing::warn!(%err, "could not restore pre-stop state");
        }
        self.tree.stop(root, StopHow::Freeze);
        self.stopping = true;
        self.notifications.notify("preparingToStop");
        let options = SetStateOptions::dissolve();
        if let Err(err) = self.dissolve_to_state(completed, &options, true) {
            tracing::warn!(%err, "dissolve to completed state failed");
            self.stopping = false;
            self.notifications.notify("stopped");
        }
    }

    pub fn get_state(&self) -> FigureResult<FigureState> {
        FigureState::capture(&self.tree, self.now())
    }

    /// Move the figure to `state`, instantly or through a transition.
    ///
    /// Running animations are frozen first. A transition publishes `stateSet` when done.
    #[tracing::instrument(skip(self, state, options), fields(how = ?options.how))]
    pub fn set_state(&mut self, state: FigureState, options: &SetStateOptions) -> FigureResult<()> {
        match options.how {
            StateHow::Instant => {
                let root = self.root();
                self.tree.stop(root, StopHow::Freeze);
                self.transition = None;
                let now = self.now();
                state.restore(&mut self.tree, now)?;
                self.notifications.notify("stateSet");
                Ok(())
            }
            StateHow::Animate => self.animate_to_state(state, options),
            StateHow::Dissolve => self.dissolve_to_state(state, options, false),
        }
    }

    fn animate_to_state(
        &mut self,
        state: FigureState,
        options: &SetStateOptions,
    ) -> FigureResult<()> {
        let root = self.root();
        self.tree.stop(root, StopHow::Freeze);
        let duration = options.resolve_duration(state.duration).map(StateDuration::total);
        let target = Rc::new(state);
        for (id, el_state) in target.elements.pairs(&self.tree, root) {
            let Some(el) = self.tree.get(id) else {
                continue;
            };
            let same = el.transform.is_equal_shape_to(&el_state.transform)
                && el.transform.is_within_delta(&el_state.transform, 1e-8)
                && el.color.is_within_delta(el_state.color, 1e-8)
                && el.is_shown == el_state.is_shown;
            if same {
                continue;
            }
            let mut scenario = ScenarioStep::to(ScenarioTarget {
                transform: Some(el_state.transform.clone()),
                color: Some(el_state.color),
                is_shown: Some(el_state.is_shown),
                ..ScenarioTarget::default()
            })
            .max_duration(options.max_duration)
            .zero_duration_threshold(options.zero_duration_threshold)
            .all_durations_same(options.all_durations_same);
            let step = match duration {
                Some(d) => AnimationStep::scenario(scenario).with_duration(d),
                None => {
                    scenario = scenario.with_velocity(options.velocity);
                    AnimationStep::scenario(scenario)
                }
            };
            self.tree
                .start_animation(id, step.named(STATE_TRANSITION), When::SyncNow);
        }
        self.transition = Some(Transition {
            target,
            publish_stopped: false,
        });
        self.check_transition();
        Ok(())
    }

    /// Fade the root out, apply `state` below it, fade back in.
    fn dissolve_to_state(
        &mut self,
        state: FigureState,
        options: &SetStateOptions,
        publish_stopped: bool,
    ) -> FigureResult<()> {
        let root = self.root();
        self.tree.stop(root, StopHow::Freeze);
        let [out, delay, into] = options
            .resolve_duration(state.duration)
            .map_or([0.8, 0.2, 0.8], StateDuration::phases);
        let target = Rc::new(state);
        let target_opacity = target.elements.opacity;
        let apply = {
            let target = target.clone();
            trigger_fn(move |tree: &mut ElementTree, _: &Value| {
                let root = tree.root();
                if let Err(err) = tree.set_children_state(root, &target.elements, 0.0) {
                    tracing::warn!(%err, "could not apply dissolved state");
                }
                None
            })
        };
        let sequence = self
            .tree
            .animate(root)
            .named(STATE_TRANSITION)
            .opacity(OpacityStep::to(DISSOLVED), out)
            .delay(delay)
            .trigger(apply)
            .opacity(OpacityStep::to(target_opacity), into);
        sequence.start(&mut self.tree, When::SyncNow);
        self.transition = Some(Transition {
            target,
            publish_stopped,
        });
        Ok(())
    }

    /// Finish a transition whose animations have drained.
    fn check_transition(&mut self) {
        if self.transition.is_none() || self.is_animating() {
            return;
        }
        let Some(t) = self.transition.take() else {
            return;
        };
        let now = self.now();
        // Snapshot clocks are relative to the capture; the transition took real time since.
        let delta = now - t.target.state_time;
        if let Err(err) = self.tree.set_element_state(self.root(), &t.target.elements, delta) {
            tracing::warn!(%err, "could not finish state transition");
        }
        self.notifications.notify("stateSet");
        if t.publish_stopped {
            self.stopping = false;
            self.notifications.notify("stopped");
        }
    }

    fn check_stopped(&mut self) {
        if !self.stopping || self.transition.is_some() {
            return;
        }
        if self.tree.is_any_preparing_to_stop(self.root()) {
            return;
        }
        self.stopping = false;
        self.notifications.notify("stopped");
    }

    /// Pointer down at a figure-space point. Returns whether an element started moving.
    pub fn touch_down(&mut self, p: Point) -> bool {
        let touched = self.tree.get_touched(p);
        self.notifications
            .publish("touch", &serde_json::json!([p.x, p.y]));
        let candidate = if self.options.move_top_element_only {
            touched.first().copied().filter(|id| self.is_movable(*id))
        } else {
            touched.iter().copied().find(|id| self.is_movable(*id))
        };
        for id in &touched {
            if let Some(el) = self.tree.get(*id) {
                el.notifications.notify("touched");
            }
        }
        let Some(id) = candidate else {
            return false;
        };
        self.tree.start_being_moved(id);
        self.being_moved = Some(id);
        true
    }

    fn is_movable(&self, id: ElementId) -> bool {
        self.tree.get(id).is_some_and(|e| e.is_movable)
    }

    /// Drag from `prev` to `curr`, both in figure space.
    pub fn touch_move(&mut self, prev: Point, curr: Point) {
        let Some(id) = self.being_moved else {
            return;
        };
        let Some(el) = self.tree.get(id) else {
            self.being_moved = None;
            return;
        };
        let to_parent = el
            .parent()
            .map_or(Transform::new(), |p| self.tree.figure_transform(p))
            .matrix()
            .inverse();
        let delta = to_parent * curr - to_parent * prev;
        let mut next = el.transform.clone();
        let Some(position) = next.t() else {
            tracing::debug!(path = %self.tree.get_path(id), "dragged element has no translation");
            return;
        };
        next.update_translation(position + delta, None);
        self.tree.moved(id, next);
    }

    /// Release the dragged element; it coasts if it was moving.
    pub fn touch_up(&mut self) {
        let Some(id) = self.being_moved.take() else {
            return;
        };
        self.tree.stop_being_moved(id);
        let coasting = self.tree.get(id).is_some_and(|e| {
            !e.movement
                .velocity
                .is_zero(e.move_config.freely.zero_velocity_threshold)
        });
        if coasting {
            self.tree.start_moving_freely(id);
        }
    }

    /// Snapshot of one element, for building partial targets.
    pub fn get_element_state(&self, id: ElementId) -> Option<ElementState> {
        self.tree.get_element_state(id)
    }
}

/// Queue one figure draw per frame, however many redraws are requested.
fn redraw_hook(figure: Weak<RefCell<Figure>>, global: Rc<GlobalAnimation>) -> impl Fn() + 'static {
    let queued = Rc::new(Cell::new(false));
    move || {
        if queued.replace(true) {
            return;
        }
        schedule_draw(figure.clone(), global.clone(), queued.clone());
    }
}

/// A figure that is borrowed when its frame comes up draws on the frame after.
fn schedule_draw(
    figure: Weak<RefCell<Figure>>,
    global: Rc<GlobalAnimation>,
    queued: Rc<Cell<bool>>,
) {
    let next = global.clone();
    global.queue_next_frame(move |now| {
        let Some(strong) = figure.upgrade() else {
            queued.set(false);
            return;
        };
        let Ok(mut f) = strong.try_borrow_mut() else {
            tracing::debug!("figure busy during scheduled draw, retrying next frame");
            schedule_draw(figure, next, queued);
            return;
        };
        queued.set(false);
        f.draw(now);
    });
}

#[cfg(test)]
#[path = "../tests/unit/figure/figure.rs"]
mod tests;
