//! Per-variant step payloads.
//!
//! Property steps implement [`Interpolate`]; the frame loop in
//! [`step`](crate::animation::step) drives them. Control and group steps are dispatched there
//! directly.

use crate::element::node::ElementId;
use crate::element::tree::ElementTree;
use crate::foundation::core::When;

/// Color, opacity and dissolves.
pub mod color;
/// Custom callback and trigger steps.
pub mod control;
/// Serial and parallel children.
pub mod group;
/// Position, rotation, scale and whole-transform steps.
pub mod motion;
/// Pulse step.
pub mod pulse;
/// Scenario step: several properties to a target state at once.
pub mod scenario;

/// A step that moves one element property from a start value to a target value.
pub(crate) trait Interpolate {
    /// Bind start and target values when the step starts.
    ///
    /// Returns a duration when the step derives its own from a velocity.
    fn bind(&mut self, element: ElementId, when: When, tree: &mut ElementTree) -> Option<f64>;

    /// Apply progress in `[0, 1]`, already eased.
    fn apply(&self, element: ElementId, progress: f64, tree: &mut ElementTree);

    fn apply_end(&self, element: ElementId, tree: &mut ElementTree);
}

/// `distance / velocity` capped at `max_duration`. A zero velocity snaps instantly.
pub(crate) fn velocity_duration(
    distance: f64,
    velocity: Option<f64>,
    max_duration: Option<f64>,
) -> Option<f64> {
    let v = velocity?.abs();
    let d = if v == 0.0 { 0.0 } else { distance.abs() / v };
    Some(max_duration.map_or(d, |m| d.min(m)))
}

/// Whether a start value given up front should be applied at `start` rather than first frame.
pub(crate) fn applies_now(when: When) -> bool {
    matches!(when, When::Now | When::PrevFrame)
}
