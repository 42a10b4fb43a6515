//! The step state machine.
//!
//! Every step, leaf or group, is an [`AnimationStep`]: shared timing state plus a [`StepKind`]
//! payload. A step moves `Idle -> Animating -> Finished`, passing through `WaitingToStart`
//! while a serial parent has not reached it yet.

use crate::animation::callback::{Callback, FinishFn, opt_callback};
use crate::animation::ease::Progression;
use crate::animation::steps::color::{ColorStep, OpacityStep};
use crate::animation::steps::control::{CustomStep, TriggerStep};
use crate::animation::steps::group::GroupStep;
use crate::animation::steps::motion::{PositionStep, RotationStep, ScaleStep, TransformStep};
use crate::animation::steps::pulse::PulseStep;
use crate::animation::steps::scenario::ScenarioStep;
use crate::animation::steps::{Interpolate, applies_now};
use crate::element::node::ElementId;
use crate::element::tree::ElementTree;
use crate::foundation::core::{Force, When};
use crate::foundation::math::round;

/// Decimal places `remaining` is rounded to before deciding a step has finished.
pub const DEFAULT_PRECISION: u32 = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepState {
    #[default]
    Idle,
    WaitingToStart,
    Animating,
    Finished,
}

/// Variant payload, tagged in snapshots as `"<variant>AnimationStep"`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "f1Type")]
pub enum StepKind {
    #[serde(rename = "positionAnimationStep")]
    Position(PositionStep),
    #[serde(rename = "rotationAnimationStep")]
    Rotation(RotationStep),
    #[serde(rename = "scaleAnimationStep")]
    Scale(ScaleStep),
    #[serde(rename = "transformAnimationStep")]
    Transform(TransformStep),
    #[serde(rename = "colorAnimationStep")]
    Color(ColorStep),
    #[serde(rename = "opacityAnimationStep")]
    Opacity(OpacityStep),
    #[serde(rename = "scenarioAnimationStep")]
    Scenario(ScenarioStep),
    #[serde(rename = "pulseAnimationStep")]
    Pulse(PulseStep),
    #[serde(rename = "customAnimationStep")]
    Custom(CustomStep),
    #[serde(rename = "triggerAnimationStep")]
    Trigger(TriggerStep),
    #[serde(rename = "delayAnimationStep")]
    Delay,
    #[serde(rename = "serialAnimationStep")]
    Serial(GroupStep),
    #[serde(rename = "parallelAnimationStep")]
    Parallel(GroupStep),
}

impl StepKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Position(_) => "position",
            Self::Rotation(_) => "rotation",
            Self::Scale(_) => "scale",
            Self::Transform(_) => "transform",
            Self::Color(_) => "color",
            Self::Opacity(_) => "opacity",
            Self::Scenario(_) => "scenario",
            Self::Pulse(_) => "pulse",
            Self::Custom(_) => "custom",
            Self::Trigger(_) => "trigger",
            Self::Delay => "delay",
            Self::Serial(_) => "serial",
            Self::Parallel(_) => "parallel",
        }
    }

    fn default_duration(&self) -> f64 {
        match self {
            Self::Trigger(_) | Self::Delay => 0.0,
            Self::Pulse(p) => p.options.duration,
            Self::Scenario(s) if s.velocity.is_some() => 0.0,
            _ => 1.0,
        }
    }

    fn interpolator(&self) -> Option<&dyn Interpolate> {
        match self {
            Self::Position(s) => Some(s),
            Self::Rotation(s) => Some(s),
            Self::Scale(s) => Some(s),
            Self::Transform(s) => Some(s),
            Self::Color(s) => Some(s),
            Self::Opacity(s) => Some(s),
            _ => None,
        }
    }

    fn interpolator_mut(&mut self) -> Option<&mut dyn Interpolate> {
        match self {
            Self::Position(s) => Some(s),
            Self::Rotation(s) => Some(s),
            Self::Scale(s) => Some(s),
            Self::Transform(s) => Some(s),
            Self::Color(s) => Some(s),
            Self::Opacity(s) => Some(s),
            _ => None,
        }
    }

    fn is_group(&self) -> bool {
        matches!(self, Self::Serial(_) | Self::Parallel(_) | Self::Scenario(_))
    }
}

/// One node of an animation: timing, lifecycle and a variant payload.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationStep {
    pub name: String,
    pub element: Option<ElementId>,
    pub state: StepState,
    /// Seconds. `None` until bound by `start` or the first frame.
    pub start_time: Option<f64>,
    pub duration: f64,
    pub delay: f64,
    pub progression: Progression,
    /// What a plain cancel does: `Some(true)` completes, `Some(false)` freezes.
    pub complete_on_cancel: Option<bool>,
    pub remove_on_finish: bool,
    pub precision: u32,
    pub start_time_offset: f64,
    #[serde(default, with = "opt_callback")]
    pub on_finish: Option<Callback<FinishFn>>,
    #[serde(flatten)]
    pub kind: StepKind,
}

impl AnimationStep {
    pub fn new(kind: StepKind) -> Self {
        Self {
            name: String::new(),
            element: None,
            state: StepState::Idle,
            start_time: None,
            duration: kind.default_duration(),
            delay: 0.0,
            progression: Progression::Linear,
            complete_on_cancel: None,
            remove_on_finish: true,
            precision: DEFAULT_PRECISION,
            start_time_offset: 0.0,
            on_finish: None,
            kind,
        }
    }

    pub fn position(step: PositionStep) -> Self {
        Self::new(StepKind::Position(step))
    }

    pub fn rotation(step: RotationStep) -> Self {
        Self::new(StepKind::Rotation(step))
    }

    pub fn scale(step: ScaleStep) -> Self {
        Self::new(StepKind::Scale(step))
    }

    pub fn transform(step: TransformStep) -> Self {
        Self::new(StepKind::Transform(step))
    }

    pub fn color(step: ColorStep) -> Self {
        Self::new(StepKind::Color(step))
    }

    pub fn opacity(step: OpacityStep) -> Self {
        Self::new(StepKind::Opacity(step))
    }

    pub fn scenario(step: ScenarioStep) -> Self {
        Self::new(StepKind::Scenario(step))
    }

    pub fn pulse(step: PulseStep) -> Self {
        Self::new(StepKind::Pulse(step))
    }

    pub fn custom(step: CustomStep) -> Self {
        Self::new(StepKind::Custom(step))
    }

    pub fn trigger(step: TriggerStep) -> Self {
        Self::new(StepKind::Trigger(step))
    }

    pub fn delay_for(seconds: f64) -> Self {
        Self::new(StepKind::Delay).with_duration(seconds)
    }

    pub fn serial(steps: Vec<AnimationStep>) -> Self {
        Self::new(StepKind::Serial(GroupStep::new(steps)))
    }

    pub fn parallel(steps: Vec<AnimationStep>) -> Self {
        Self::new(StepKind::Parallel(GroupStep::new(steps)))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Target `element`, here and in every child that has no element of its own.
    pub fn on(mut self, element: ElementId) -> Self {
        self.set_default_element(element);
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    pub fn with_delay(mut self, seconds: f64) -> Self {
        self.delay = seconds;
        self
    }

    pub fn with_progression(mut self, progression: Progression) -> Self {
        self.progression = progression;
        self
    }

    pub fn complete_on_cancel(mut self, complete: bool) -> Self {
        self.complete_on_cancel = Some(complete);
        self
    }

    pub fn when_finished(mut self, callback: Callback<FinishFn>) -> Self {
        self.on_finish = Some(callback);
        self
    }

    pub(crate) fn set_default_element(&mut self, element: ElementId) {
        if self.element.is_none() {
            self.element = Some(element);
        }
        for child in self.children_mut() {
            child.set_default_element(element);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == StepState::Finished
    }

    /// Started and not yet finished.
    pub fn is_active(&self) -> bool {
        matches!(self.state, StepState::WaitingToStart | StepState::Animating)
    }

    pub fn children(&self) -> &[AnimationStep] {
        match &self.kind {
            StepKind::Serial(g) | StepKind::Parallel(g) => &g.steps,
            StepKind::Scenario(s) => &s.steps,
            _ => &[],
        }
    }

    fn children_mut(&mut self) -> &mut [AnimationStep] {
        match &mut self.kind {
            StepKind::Serial(g) | StepKind::Parallel(g) => &mut g.steps,
            StepKind::Scenario(s) => &mut s.steps,
            _ => &mut [],
        }
    }

    /// Depth-first search by name, this step included.
    pub fn find(&self, name: &str) -> Option<&AnimationStep> {
        if self.name == name {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find(name))
    }

    pub(crate) fn start_waiting(&mut self) {
        self.state = StepState::WaitingToStart;
        for child in self.children_mut() {
            child.start_waiting();
        }
    }

    /// Start the step. Finished steps are never restarted.
    pub fn start(&mut self, when: When, tree: &mut ElementTree) {
        match self.state {
            StepState::Finished => return,
            StepState::Animating if matches!(self.kind, StepKind::Serial(_)) => return,
            _ => {}
        }
        if let StepKind::Custom(c) = &self.kind {
            self.start_time_offset = self.progression.invert(c.start_percent) * self.duration;
        }
        if self.kind.is_group() {
            self.start_waiting();
        }
        self.state = StepState::Animating;
        self.start_time = tree.global.get_when(when).map(|t| t - self.start_time_offset);
        tracing::trace!(step = %self.name, kind = self.kind.type_name(), "step started");

        let element = self.element;
        if let Some(interp) = self.kind.interpolator_mut() {
            match element {
                Some(el) => {
                    if let Some(d) = interp.bind(el, when, tree) {
                        self.duration = d;
                    }
                }
                None => self.duration = 0.0,
            }
            return;
        }

        match &mut self.kind {
            StepKind::Custom(_) | StepKind::Trigger(_) => {
                if applies_now(when) {
                    self.set_frame(self.start_time_offset, tree);
                }
            }
            StepKind::Serial(_) => {
                self.push_delay_into_children();
                let done = match &mut self.kind {
                    StepKind::Serial(group) => {
                        group.index = 0;
                        group.start_from_index(when, tree)
                    }
                    _ => false,
                };
                if done {
                    self.finish(false, None, tree);
                }
            }
            StepKind::Parallel(_) => {
                self.push_delay_into_children();
                for child in self.children_mut() {
                    child.start(when, tree);
                    child.finish_if_zero_duration(tree);
                }
            }
            StepKind::Scenario(scenario) => {
                let mut steps = match element {
                    Some(el) => scenario.build(
                        el,
                        self.duration,
                        self.delay,
                        self.progression,
                        tree,
                    ),
                    None => {
                        tracing::warn!(step = %self.name, "scenario step has no element");
                        Vec::new()
                    }
                };
                for child in &mut steps {
                    child.start_waiting();
                    child.start(when, tree);
                    child.finish_if_zero_duration(tree);
                }
                scenario.steps = steps;
            }
            _ => {}
        }
    }

    /// Groups take their delay out on their children.
    fn push_delay_into_children(&mut self) {
        if self.delay == 0.0 {
            return;
        }
        let delay = std::mem::take(&mut self.delay);
        match &mut self.kind {
            StepKind::Serial(g) => {
                if let Some(first) = g.steps.first_mut() {
                    first.delay += delay;
                }
            }
            StepKind::Parallel(g) => {
                for step in &mut g.steps {
                    step.delay += delay;
                }
            }
            _ => self.delay = delay,
        }
    }

    /// Finish at once when there is nothing to animate.
    pub fn finish_if_zero_duration(&mut self, tree: &mut ElementTree) {
        if !self.is_active() {
            return;
        }
        let done = if self.kind.is_group() {
            self.children().iter().all(AnimationStep::is_finished)
        } else {
            self.duration == 0.0 && self.delay == 0.0
        };
        if done {
            self.finish(false, None, tree);
        }
    }

    /// Advance to `now` (seconds). Returns the time left, negative while still running.
    ///
    /// A non-negative return is the overshoot past the step's end.
    pub fn next_frame(&mut self, now: f64, speed: f64, tree: &mut ElementTree) -> f64 {
        if !self.is_active() {
            return 0.0;
        }
        let start = *self.start_time.get_or_insert(now - self.start_time_offset);
        match self.kind {
            StepKind::Serial(_) => self.serial_frame(now, speed, tree),
            StepKind::Parallel(_) | StepKind::Scenario(_) => self.parallel_frame(now, speed, tree),
            _ => self.leaf_frame(now - start, speed, tree),
        }
    }

    fn leaf_frame(&mut self, elapsed: f64, speed: f64, tree: &mut ElementTree) -> f64 {
        let delta = elapsed * speed;
        if delta >= self.delay {
            self.state = StepState::Animating;
            self.set_frame((delta - self.delay).min(self.duration), tree);
            if self.is_finished() {
                return 0.0;
            }
        }
        let remaining = round(delta - (self.duration + self.delay), self.precision);
        if remaining >= 0.0 {
            self.finish(false, None, tree);
        }
        remaining
    }

    fn serial_frame(&mut self, now: f64, speed: f64, tree: &mut ElementTree) -> f64 {
        let StepKind::Serial(group) = &mut self.kind else {
            return 0.0;
        };
        let mut remaining = -1.0;
        let mut done = false;
        loop {
            let Some(step) = group.steps.get_mut(group.index) else {
                done = true;
                break;
            };
            remaining = step.next_frame(now, speed, tree);
            if remaining < 0.0 {
                break;
            }
            if group.index + 1 >= group.steps.len() {
                done = true;
                break;
            }
            group.index += 1;
            if group.start_from_index(When::At(now - remaining / speed), tree) {
                done = true;
                break;
            }
        }
        if done {
            self.finish(false, None, tree);
        }
        remaining
    }

    fn parallel_frame(&mut self, now: f64, speed: f64, tree: &mut ElementTree) -> f64 {
        let mut remaining: Option<f64> = None;
        for step in self.children_mut().iter_mut().filter(|s| s.is_active()) {
            let r = step.next_frame(now, speed, tree);
            remaining = Some(remaining.map_or(r, |m| m.min(r)));
        }
        let remaining = remaining.unwrap_or(0.0);
        if remaining >= 0.0 {
            self.finish(false, None, tree);
        }
        remaining
    }

    /// Apply the step at `dt` seconds past its delay.
    fn set_frame(&mut self, dt: f64, tree: &mut ElementTree) {
        let fraction = if self.duration > 0.0 { dt / self.duration } else { 1.0 };
        let progress = self.progression.apply(fraction);
        let element = self.element;
        let cancel = match &mut self.kind {
            StepKind::Custom(custom) => custom.call(progress, tree),
            StepKind::Trigger(trigger) => {
                if let Some(d) = trigger.fire(tree) {
                    self.duration = d;
                }
                false
            }
            StepKind::Pulse(pulse) => {
                if let Some(el) = element {
                    pulse.frame(el, tree);
                }
                false
            }
            kind => {
                if let (Some(el), Some(interp)) = (element, kind.interpolator()) {
                    interp.apply(el, progress, tree);
                }
                false
            }
        };
        if cancel {
            self.duration = dt;
            self.finish(true, Some(Force::Freeze), tree);
        }
    }

    fn set_to_end(&mut self, tree: &mut ElementTree) {
        let element = self.element;
        match &mut self.kind {
            StepKind::Custom(custom) => {
                custom.call(1.0, tree);
            }
            StepKind::Trigger(trigger) => trigger.fire_end(tree),
            StepKind::Pulse(pulse) => {
                if let Some(el) = element {
                    pulse.end(el, tree);
                }
            }
            kind => {
                if let (Some(el), Some(interp)) = (element, kind.interpolator()) {
                    interp.apply_end(el, tree);
                }
            }
        }
    }

    /// End the step now.
    ///
    /// The end value is applied unless the step is cancelled and neither `force` nor the
    /// step's own `complete_on_cancel` asks for completion.
    pub fn finish(&mut self, cancelled: bool, force: Option<Force>, tree: &mut ElementTree) {
        if !self.is_active() {
            return;
        }
        let was_waiting = self.state == StepState::WaitingToStart;
        tracing::debug!(
            step = %self.name,
            kind = self.kind.type_name(),
            cancelled,
            "step finished"
        );

        if self.kind.is_group() {
            let force = force.or(match self.complete_on_cancel {
                Some(true) => Some(Force::Complete),
                Some(false) => Some(Force::Freeze),
                None => None,
            });
            let completes = !cancelled || force == Some(Force::Complete);
            if was_waiting && completes && matches!(self.kind, StepKind::Scenario(_)) {
                self.start(When::NextFrame, tree);
                if self.is_finished() {
                    return;
                }
            }
            self.state = StepState::Finished;
            for child in self.children_mut() {
                if child.is_active() {
                    child.finish(cancelled, force, tree);
                }
            }
        } else {
            let apply_end = !cancelled
                || force == Some(Force::Complete)
                || (force.is_none() && self.complete_on_cancel == Some(true));
            if apply_end {
                if was_waiting {
                    self.start(When::NextFrame, tree);
                }
                self.state = StepState::Finished;
                self.set_to_end(tree);
            } else {
                self.state = StepState::Finished;
                if let (true, Some(el), StepKind::Opacity(opacity)) =
                    (was_waiting, self.element, &self.kind)
                {
                    opacity.cancelled_without_end(el, tree);
                }
            }
        }

        if let Some(f) = self.on_finish.as_ref().and_then(|cb| tree.functions.resolve(cb)) {
            f(tree, cancelled);
        }
    }

    /// Cancel: finish without completing unless forced or configured to.
    pub fn cancel(&mut self, force: Option<Force>, tree: &mut ElementTree) {
        self.finish(true, force, tree);
    }

    /// Duration plus delay; sum of children for serial, longest child for parallel.
    pub fn get_total_duration(&self) -> f64 {
        match &self.kind {
            StepKind::Serial(g) => {
                self.delay + g.steps.iter().map(AnimationStep::get_total_duration).sum::<f64>()
            }
            StepKind::Parallel(g) => self.delay + longest(&g.steps),
            StepKind::Scenario(s) if !s.steps.is_empty() => longest(&s.steps),
            _ => self.duration + self.delay,
        }
    }

    /// Seconds until the step ends. Unbound steps report their whole duration while active.
    pub fn get_remaining_time(&self, now: f64) -> f64 {
        if !self.is_active() {
            return 0.0;
        }
        let total = self.get_total_duration();
        match self.start_time {
            None => total,
            Some(start) => total - (now - start),
        }
    }

    /// Rebase the start time so progress is continuous across a speed change.
    pub fn set_time_speed(&mut self, old_speed: f64, new_speed: f64, now: f64) {
        if let Some(start) = self.start_time {
            self.start_time = Some(now - (now - start) * old_speed / new_speed);
        }
        for child in self.children_mut() {
            child.set_time_speed(old_speed, new_speed, now);
        }
    }

    /// Shift the start time by `delta`, or unbind it with `None`.
    pub fn set_time_delta(&mut self, delta: Option<f64>) {
        self.start_time = match (self.start_time, delta) {
            (Some(start), Some(d)) => Some(start + d),
            (start, Some(_)) => start,
            (_, None) => None,
        };
        for child in self.children_mut() {
            child.set_time_delta(delta);
        }
    }
}

fn longest(steps: &[AnimationStep]) -> f64 {
    steps
        .iter()
        .map(AnimationStep::get_total_duration)
        .fold(0.0, f64::max)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/step.rs"]
mod tests;
