use serde_json::Value;

use crate::element::node::{ElementId, StopSource};
use crate::element::tree::ElementTree;
use crate::foundation::core::{Force, StopHow};

impl ElementTree {
    /// Stop `id` and everything below it.
    ///
    /// `AnimateToComplete` and `DissolveToComplete` leave running work to drain; each element
    /// publishes `preparingToStop` now and `stopped` once its last source finishes.
    #[tracing::instrument(skip(self))]
    pub fn stop(&mut self, id: ElementId, how: StopHow) {
        for element in self.get_all_elements(id) {
            self.stop_element(element, how);
        }
    }

    fn stop_element(&mut self, id: ElementId, how: StopHow) {
        let Some(el) = self.get_mut(id) else {
            return;
        };
        if matches!(how, StopHow::AnimateToComplete | StopHow::DissolveToComplete) {
            let active = [
                (StopSource::Animations, el.animations.is_animating()),
                (StopSource::Pulse, el.pulse.is_pulsing),
                (StopSource::MovingFreely, el.movement.is_moving_freely),
            ];
            for (source, on) in active {
                if on {
                    el.pending_stops.insert(source);
                }
            }
            if !el.pending_stops.is_empty() {
                el.notifications.notify("preparingToStop");
            }
        }

        match how {
            StopHow::Freeze => self.cancel_all_animations(id, Some(Force::Freeze)),
            StopHow::Cancel => self.cancel_all_animations(id, None),
            StopHow::Complete => self.cancel_all_animations(id, Some(Force::Complete)),
            StopHow::AnimateToComplete | StopHow::DissolveToComplete => {}
        }

        let motion_how = match how {
            StopHow::DissolveToComplete => StopHow::Cancel,
            other => other,
        };
        self.stop_moving_freely(id, motion_how);
        self.stop_being_moved(id);
        self.stop_pulsing(id, motion_how);
    }

    /// Whether `id` is still draining work after an animate-to-complete stop.
    pub fn is_preparing_to_stop(&self, id: ElementId) -> bool {
        self.get(id).is_some_and(|e| !e.pending_stops.is_empty())
    }

    /// Whether anything at or below `id` is still draining.
    pub fn is_any_preparing_to_stop(&self, id: ElementId) -> bool {
        self.get_all_elements(id)
            .into_iter()
            .any(|e| self.is_preparing_to_stop(e))
    }

    /// Record that `source` is done on `id`; publishes `stopped` once nothing is pending.
    pub(crate) fn source_finished(&mut self, id: ElementId, source: StopSource) {
        let Some(el) = self.get_mut(id) else {
            return;
        };
        if !el.pending_stops.remove(&source) {
            return;
        }
        if el.pending_stops.is_empty() {
            let notifications = el.notifications.clone();
            notifications.publish("stopped", &Value::Null);
        }
    }

    /// Clear pending sources that went quiet without reporting.
    ///
    /// Hidden elements never advance, so everything pending on them counts as drained.
    pub(crate) fn check_pending_stops(&mut self, id: ElementId) {
        for element in self.get_all_elements(id) {
            let Some(el) = self.get(element) else {
                continue;
            };
            if el.pending_stops.is_empty() {
                continue;
            }
            let hidden = self
                .ancestors(element)
                .into_iter()
                .any(|a| self.get(a).is_some_and(|e| !e.is_shown));
            let quiet = [
                (StopSource::Animations, hidden || !el.animations.is_animating()),
                (StopSource::Pulse, hidden || !el.pulse.is_pulsing),
                (StopSource::MovingFreely, hidden || !el.movement.is_moving_freely),
            ];
            for (source, done) in quiet {
                if done {
                    self.source_finished(element, source);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/element/stop.rs"]
mod tests;
