use std::mem;

use crate::animation::step::AnimationStep;
use crate::element::node::{ElementId, StopSource};
use crate::element::tree::ElementTree;
use crate::foundation::core::{Force, When};
use crate::foundation::error::{FigureError, FigureResult};
use crate::notify::Notifications;

/// Animations whose name starts with this survive `cancel_all_animations`.
pub const NO_STOP_PREFIX: &str = "_noStop_";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ManagerState {
    #[default]
    Idle,
    Animating,
    /// Frames are skipped; start times shift by the paused span on unpause.
    Paused,
}

/// An element's top-level animations.
///
/// Publishes `finished` on its own channel when it goes from animating to idle.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationManager {
    pub animations: Vec<AnimationStep>,
    pub state: ManagerState,
    /// Multiplies elapsed time for every step.
    pub animation_speed: f64,
    pub paused_at: Option<f64>,
    #[serde(skip)]
    pub notifications: Notifications,
}

impl Default for AnimationManager {
    fn default() -> Self {
        Self {
            animations: Vec::new(),
            state: ManagerState::Idle,
            animation_speed: 1.0,
            paused_at: None,
            notifications: Notifications::default(),
        }
    }
}

impl AnimationManager {
    pub fn is_animating(&self) -> bool {
        match self.state {
            ManagerState::Animating => true,
            ManagerState::Paused => false,
            ManagerState::Idle => self.animations.iter().any(AnimationStep::is_active),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state == ManagerState::Paused
    }

    /// Hold every animation where it is until [`unpause`](Self::unpause).
    pub fn pause(&mut self, now: f64) {
        if self.state == ManagerState::Paused {
            return;
        }
        self.paused_at = Some(now);
        self.state = ManagerState::Paused;
    }

    pub fn unpause(&mut self, now: f64) {
        let Some(at) = self.paused_at.take() else {
            return;
        };
        self.set_time_delta(Some(now - at));
        self.state = if self.animations.iter().any(AnimationStep::is_active) {
            ManagerState::Animating
        } else {
            ManagerState::Idle
        };
    }

    /// Like [`is_animating`](Self::is_animating); kept for callers asking before the first frame.
    pub fn will_start_animating(&self) -> bool {
        self.is_animating()
    }

    pub fn get(&self, name: &str) -> Option<&AnimationStep> {
        self.animations.iter().find(|a| a.name == name)
    }

    /// Longest total duration over all animations.
    pub fn get_total_duration(&self) -> f64 {
        self.animations
            .iter()
            .map(AnimationStep::get_total_duration)
            .fold(0.0, f64::max)
    }

    /// Longest remaining time, over `names` only when any are given.
    pub fn get_remaining_time(&self, names: &[&str], now: f64) -> f64 {
        self.animations
            .iter()
            .filter(|a| names.is_empty() || names.contains(&a.name.as_str()))
            .map(|a| a.get_remaining_time(now))
            .fold(0.0, f64::max)
    }

    /// Soonest positive remaining time, if any animation is still running.
    pub fn get_next_animation_finish_time(&self, now: f64) -> Option<f64> {
        self.animations
            .iter()
            .map(|a| a.get_remaining_time(now))
            .filter(|r| *r > 0.0)
            .reduce(f64::min)
    }

    pub fn set_time_delta(&mut self, delta: Option<f64>) {
        for a in &mut self.animations {
            a.set_time_delta(delta);
        }
    }

    /// Change the speed without a jump in progress.
    pub fn set_time_speed(&mut self, speed: f64, now: f64) -> FigureResult<()> {
        if speed <= 0.0 || !speed.is_finite() {
            return Err(FigureError::validation(format!(
                "animation speed must be positive, got {speed}"
            )));
        }
        for a in &mut self.animations {
            a.set_time_speed(self.animation_speed, speed, now);
        }
        self.animation_speed = speed;
        Ok(())
    }
}

impl ElementTree {
    /// Run `f` on the element's animations while they are out of the tree.
    ///
    /// Animations added to the element meanwhile are appended afterwards.
    fn with_animations<R>(
        &mut self,
        id: ElementId,
        f: impl FnOnce(&mut Vec<AnimationStep>, &mut Self) -> R,
    ) -> Option<R> {
        let mut steps = mem::take(&mut self.get_mut(id)?.animations.animations);
        let out = f(&mut steps, self);
        if let Some(el) = self.get_mut(id) {
            let added = mem::replace(&mut el.animations.animations, steps);
            el.animations.animations.extend(added);
        }
        Some(out)
    }

    /// Drop finished animations and sync the manager state.
    ///
    /// `finished` fires when the manager was animating, or always with `announce`.
    fn clean_animations(&mut self, id: ElementId, announce: bool) {
        let Some(el) = self.get_mut(id) else {
            return;
        };
        let manager = &mut el.animations;
        manager
            .animations
            .retain(|a| !(a.is_finished() && a.remove_on_finish));
        if manager.state == ManagerState::Paused {
            return;
        }
        let animating = manager.animations.iter().any(AnimationStep::is_active);
        let was_animating = manager.state == ManagerState::Animating;
        if animating {
            manager.state = ManagerState::Animating;
            return;
        }
        manager.state = ManagerState::Idle;
        if was_animating || announce {
            let notifications = manager.notifications.clone();
            self.source_finished(id, StopSource::Animations);
            notifications.notify("finished");
        }
    }

    /// Advance every active animation of `id`. Returns the smallest remaining time.
    pub(crate) fn animations_next_frame(&mut self, id: ElementId, now: f64) -> Option<f64> {
        let el = self.get(id)?;
        match el.animations.state {
            ManagerState::Paused => return None,
            ManagerState::Idle if el.animations.animations.is_empty() => return None,
            _ => {}
        }
        let speed = el.animations.animation_speed;
        let remaining = self.with_animations(id, |steps, tree| {
            steps
                .iter_mut()
                .filter(|s| s.is_active())
                .map(|s| s.next_frame(now, speed, tree))
                .reduce(f64::min)
        })?;
        self.clean_animations(id, false);
        remaining
    }

    /// Queue an animation on `id`, unstarted. Returns its name.
    ///
    /// Unnamed animations get a generated name. Steps without an element target `id`.
    /// An element draining toward a stop accepts nothing new; the step is dropped.
    pub fn add_animation(&mut self, id: ElementId, step: AnimationStep) -> String {
        let mut step = step.on(id);
        if step.name.is_empty() {
            step.name = self.next_animation_name();
        }
        let name = step.name.clone();
        if self.is_preparing_to_stop(id) {
            tracing::debug!(
                path = %self.get_path(id),
                animation = %name,
                "element is stopping, animation dropped"
            );
            return name;
        }
        if let Some(el) = self.get_mut(id) {
            el.animations.animations.push(step);
        }
        name
    }

    /// Start one named animation, or every unstarted one with `None`.
    pub fn start_animations(&mut self, id: ElementId, name: Option<&str>, when: When) {
        let started = self.with_animations(id, |steps, tree| {
            let mut any = false;
            for step in steps
                .iter_mut()
                .filter(|s| name.is_none_or(|n| s.name == n))
                .filter(|s| !s.is_active() && !s.is_finished())
            {
                step.start(when, tree);
                step.finish_if_zero_duration(tree);
                any = true;
            }
            any
        });
        if started.is_none() {
            return;
        }
        if let Some(el) = self.get_mut(id) {
            if !el.animations.is_paused()
                && el.animations.animations.iter().any(AnimationStep::is_active)
            {
                el.animations.state = ManagerState::Animating;
            }
        }
        self.clean_animations(id, true);
        self.request_redraw();
    }

    /// Add an animation and start it straight away.
    pub fn start_animation(&mut self, id: ElementId, step: AnimationStep, when: When) -> String {
        let name = self.add_animation(id, step);
        self.start_animations(id, Some(&name), when);
        name
    }

    pub fn cancel_animations(&mut self, id: ElementId, name: &str, force: Option<Force>) {
        self.with_animations(id, |steps, tree| {
            for step in steps.iter_mut().filter(|s| s.name == name) {
                step.cancel(force, tree);
            }
        });
        self.clean_animations(id, false);
    }

    /// Cancel every animation of `id` except those named with [`NO_STOP_PREFIX`].
    pub fn cancel_all_animations(&mut self, id: ElementId, force: Option<Force>) {
        self.with_animations(id, |steps, tree| {
            for step in steps
                .iter_mut()
                .filter(|s| !s.name.starts_with(NO_STOP_PREFIX))
            {
                step.cancel(force, tree);
            }
        });
        self.clean_animations(id, false);
    }

    pub fn set_animation_speed(&mut self, id: ElementId, speed: f64) -> FigureResult<()> {
        let now = self.now();
        self.element(id)?;
        match self.get_mut(id) {
            Some(el) => el.animations.set_time_speed(speed, now),
            None => Ok(()),
        }
    }

    pub fn pause_animations(&mut self, id: ElementId) {
        let now = self.now();
        for e in self.get_all_elements(id) {
            if let Some(el) = self.get_mut(e) {
                el.animations.pause(now);
            }
        }
    }

    pub fn unpause_animations(&mut self, id: ElementId) {
        let now = self.now();
        for e in self.get_all_elements(id) {
            if let Some(el) = self.get_mut(e) {
                el.animations.unpause(now);
            }
        }
        self.request_redraw();
    }

    pub fn set_animation_time_delta(&mut self, id: ElementId, delta: Option<f64>) {
        if let Some(el) = self.get_mut(id) {
            el.animations.set_time_delta(delta);
        }
    }

    /// Longest remaining animation time of `id`, 0 when idle.
    pub fn get_remaining_animation_time(&self, id: ElementId, now: f64) -> f64 {
        self.get(id)
            .map_or(0.0, |el| el.animations.get_remaining_time(&[], now))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/manager.rs"]
mod tests;
