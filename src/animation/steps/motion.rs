use crate::animation::steps::{Interpolate, applies_now, velocity_duration};
use crate::element::node::ElementId;
use crate::element::tree::ElementTree;
use crate::foundation::core::{Point, RotDirection, Vec2, When};
use crate::foundation::math::{ClipAngle, clip_angle, delta_angle};
use crate::foundation::tagged::opt_point;
use crate::transform::chain::Transform;
use crate::transform::velocity::{TransformVelocity, max_time_from_velocity};

/// Move the element's first translation.
///
/// Give either `target` or `delta`; the other is derived at start. `start` defaults to the
/// current position.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PositionStep {
    #[serde(with = "opt_point")]
    pub start: Option<Point>,
    #[serde(with = "opt_point")]
    pub target: Option<Point>,
    pub delta: Option<Vec2>,
    /// Units per second along the longer axis.
    pub velocity: Option<f64>,
    pub max_duration: Option<f64>,
}

impl PositionStep {
    pub fn to(target: Point) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn by(delta: Vec2) -> Self {
        Self {
            delta: Some(delta),
            ..Self::default()
        }
    }

    pub fn from(mut self, start: Point) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = Some(velocity);
        self
    }
}

impl Interpolate for PositionStep {
    fn bind(&mut self, element: ElementId, when: When, tree: &mut ElementTree) -> Option<f64> {
        let current = tree.get(element).and_then(|e| e.position()).unwrap_or(Point::ZERO);
        let start = match self.start {
            Some(s) => {
                if applies_now(when) {
                    tree.set_position(element, s);
                }
                s
            }
            None => current,
        };
        let delta = match (self.delta, self.target) {
            (Some(d), _) => d,
            (None, Some(t)) => t - start,
            (None, None) => Vec2::ZERO,
        };
        self.start = Some(start);
        self.delta = Some(delta);
        self.target = Some(start + delta);
        velocity_duration(delta.x.abs().max(delta.y.abs()), self.velocity, self.max_duration)
    }

    fn apply(&self, element: ElementId, progress: f64, tree: &mut ElementTree) {
        if let (Some(start), Some(target)) = (self.start, self.target) {
            tree.set_position(element, start.lerp(target, progress));
        }
    }

    fn apply_end(&self, element: ElementId, tree: &mut ElementTree) {
        if let Some(target) = self.target {
            tree.set_position(element, target);
        }
    }
}

/// Turn the element's first rotation.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RotationStep {
    pub start: Option<f64>,
    pub target: Option<f64>,
    pub delta: Option<f64>,
    pub direction: RotDirection,
    pub velocity: Option<f64>,
    pub max_duration: Option<f64>,
    pub clip_to: Option<ClipAngle>,
}

impl RotationStep {
    pub fn to(target: f64) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn by(delta: f64) -> Self {
        Self {
            delta: Some(delta),
            ..Self::default()
        }
    }

    pub fn direction(mut self, direction: RotDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn clip_to(mut self, range: ClipAngle) -> Self {
        self.clip_to = Some(range);
        self
    }

    fn clipped(&self, r: f64) -> f64 {
        self.clip_to.map_or(r, |range| clip_angle(r, range))
    }
}

impl Interpolate for RotationStep {
    fn bind(&mut self, element: ElementId, when: When, tree: &mut ElementTree) -> Option<f64> {
        let current = tree.get(element).and_then(|e| e.transform.r()).unwrap_or(0.0);
        let start = match self.start {
            Some(s) => {
                if applies_now(when) {
                    tree.set_rotation(element, s);
                }
                s
            }
            None => current,
        };
        let delta = match (self.delta, self.target) {
            (Some(d), _) => d,
            (None, Some(t)) => delta_angle(start, t, self.direction),
            (None, None) => 0.0,
        };
        self.start = Some(start);
        self.delta = Some(delta);
        if self.target.is_none() {
            self.target = Some(start + delta);
        }
        velocity_duration(delta, self.velocity, self.max_duration)
    }

    fn apply(&self, element: ElementId, progress: f64, tree: &mut ElementTree) {
        if let (Some(start), Some(delta)) = (self.start, self.delta) {
            tree.set_rotation(element, self.clipped(start + delta * progress));
        }
    }

    fn apply_end(&self, element: ElementId, tree: &mut ElementTree) {
        if let (Some(start), Some(delta)) = (self.start, self.delta) {
            tree.set_rotation(element, self.clipped(start + delta));
        }
    }
}

/// Scale the element's first scale component.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScaleStep {
    pub start: Option<Vec2>,
    pub target: Option<Vec2>,
    pub delta: Option<Vec2>,
    pub velocity: Option<f64>,
    pub max_duration: Option<f64>,
}

impl ScaleStep {
    pub fn to(target: Vec2) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn uniform(target: f64) -> Self {
        Self::to(Vec2::new(target, target))
    }
}

impl Interpolate for ScaleStep {
    fn bind(&mut self, element: ElementId, when: When, tree: &mut ElementTree) -> Option<f64> {
        let current = tree
            .get(element)
            .and_then(|e| e.transform.s())
            .unwrap_or(Vec2::new(1.0, 1.0));
        let start = match self.start {
            Some(s) => {
                if applies_now(when) {
                    tree.set_scale(element, s);
                }
                s
            }
            None => current,
        };
        let delta = match (self.delta, self.target) {
            (Some(d), _) => d,
            (None, Some(t)) => t - start,
            (None, None) => Vec2::ZERO,
        };
        self.start = Some(start);
        self.delta = Some(delta);
        self.target = Some(start + delta);
        velocity_duration(delta.x.abs().max(delta.y.abs()), self.velocity, self.max_duration)
    }

    fn apply(&self, element: ElementId, progress: f64, tree: &mut ElementTree) {
        if let (Some(start), Some(target)) = (self.start, self.target) {
            tree.set_scale(element, start.lerp(target, progress));
        }
    }

    fn apply_end(&self, element: ElementId, tree: &mut ElementTree) {
        if let Some(target) = self.target {
            tree.set_scale(element, target);
        }
    }
}

/// Animate every component of the element's transform at once.
///
/// Start and target must have the same shape. A mismatch is logged and the step ends
/// immediately without touching the element.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformStep {
    pub start: Option<Transform>,
    pub target: Option<Transform>,
    pub delta: Option<Transform>,
    pub direction: RotDirection,
    pub velocity: Option<TransformVelocity>,
    pub max_duration: Option<f64>,
    pub clip_to: Option<ClipAngle>,
}

impl TransformStep {
    pub fn to(target: Transform) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn from(mut self, start: Transform) -> Self {
        self.start = Some(start);
        self
    }

    pub fn direction(mut self, direction: RotDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_velocity(mut self, velocity: TransformVelocity) -> Self {
        self.velocity = Some(velocity);
        self
    }

    fn at(&self, progress: f64) -> Option<Transform> {
        let start = self.start.as_ref()?;
        let delta = self.delta.as_ref()?;
        let mut t = start.add_scaled(delta, progress).ok()?;
        if let Some(range) = self.clip_to {
            t.clip_rotation(range);
        }
        Some(t)
    }
}

impl Interpolate for TransformStep {
    fn bind(&mut self, element: ElementId, when: When, tree: &mut ElementTree) -> Option<f64> {
        let current = tree.get(element).map(|e| e.transform.clone()).unwrap_or_default();
        let start = match self.start.take() {
            Some(s) => {
                if applies_now(when) {
                    tree.set_transform(element, s.clone());
                }
                s
            }
            None => current,
        };
        let resolved = match (&self.delta, &self.target) {
            (Some(d), _) => start.add(d).map(|t| (d.clone(), t)),
            (None, Some(t)) => start.delta_to(t, self.direction).map(|d| (d, t.clone())),
            (None, None) => Ok((start.zero(), start.clone())),
        };
        let (delta, target) = match resolved {
            Ok(pair) => pair,
            Err(err) => {
                tracing::warn!(%err, "transform step start and target differ in shape");
                self.start = Some(start);
                self.delta = None;
                return Some(0.0);
            }
        };
        let duration = self.velocity.as_ref().map(|v| {
            let d = max_time_from_velocity(&start, &target, v, self.direction).unwrap_or(0.0);
            self.max_duration.map_or(d, |m| d.min(m))
        });
        self.start = Some(start);
        self.delta = Some(delta);
        self.target = Some(target);
        duration
    }

    fn apply(&self, element: ElementId, progress: f64, tree: &mut ElementTree) {
        if let Some(t) = self.at(progress) {
            tree.set_transform(element, t);
        }
    }

    fn apply_end(&self, element: ElementId, tree: &mut ElementTree) {
        if let Some(t) = self.at(1.0) {
            tree.set_transform(element, t);
        }
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/animation/steps/motion.rs"]
mod tests;
