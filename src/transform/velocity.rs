use crate::foundation::core::RotDirection;
use crate::foundation::error::FigureResult;
use crate::foundation::math::delta_angle;
use crate::transform::chain::{Component, ComponentKind, Transform};

/// Speeds per component kind, in units (or radians) per second.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformVelocity {
    pub translation: f64,
    pub rotation: f64,
    pub scale: f64,
}

impl Default for TransformVelocity {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl TransformVelocity {
    pub fn uniform(v: f64) -> Self {
        Self {
            translation: v,
            rotation: v,
            scale: v,
        }
    }

    pub fn for_kind(&self, kind: ComponentKind) -> f64 {
        match kind {
            ComponentKind::Translation => self.translation,
            ComponentKind::Rotation => self.rotation,
            ComponentKind::Scale => self.scale,
        }
    }

    /// A velocity chain shaped like `like`.
    pub fn to_transform(&self, like: &Transform) -> Transform {
        Transform::from_components(like.steps().iter().map(|s| match s.component {
            Component::Scale { .. } => Component::Scale {
                x: self.scale,
                y: self.scale,
            },
            Component::Rotation { .. } => Component::Rotation { r: self.rotation },
            Component::Translation { .. } => Component::Translation {
                x: self.translation,
                y: self.translation,
            },
        }))
    }
}

/// Longest time any component needs to travel from `start` to `target` at `velocity`.
///
/// Axes are timed independently. A component with zero velocity is ignored.
pub fn max_time_from_velocity(
    start: &Transform,
    target: &Transform,
    velocity: &TransformVelocity,
    direction: RotDirection,
) -> FigureResult<f64> {
    let delta = start.sub(target)?;
    let mut max_time: f64 = 0.0;
    for (i, step) in delta.steps().iter().enumerate() {
        let v = velocity.for_kind(step.component.kind()).abs();
        if v == 0.0 {
            continue;
        }
        let distances = match (start.steps()[i].component, target.steps()[i].component) {
            (Component::Rotation { r: s }, Component::Rotation { r: t }) => {
                vec![delta_angle(s, t, direction)]
            }
            _ => step.component.values(),
        };
        for d in distances {
            max_time = max_time.max(d.abs() / v);
        }
    }
    Ok(max_time)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/velocity.rs"]
mod tests;
