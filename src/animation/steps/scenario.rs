use crate::animation::ease::Progression;
use crate::animation::step::AnimationStep;
use crate::animation::steps::color::{ColorStep, Dissolve, OpacityStep};
use crate::animation::steps::motion::TransformStep;
use crate::element::node::{Element, ElementId};
use crate::element::tree::ElementTree;
use crate::foundation::core::{Point, Rgba, RotDirection, Vec2};
use crate::foundation::math::ClipAngle;
use crate::foundation::tagged::opt_point;
use crate::transform::chain::Transform;
use crate::transform::velocity::{TransformVelocity, max_time_from_velocity};

/// A target state for an element. Unset fields are left alone.
///
/// `position`, `rotation` and `scale` are applied on top of `transform`, or on top of the
/// element's current transform when `transform` is unset.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScenarioTarget {
    pub transform: Option<Transform>,
    #[serde(with = "opt_point")]
    pub position: Option<Point>,
    pub rotation: Option<f64>,
    pub scale: Option<Vec2>,
    pub color: Option<Rgba>,
    pub opacity: Option<f64>,
    pub is_shown: Option<bool>,
}

impl ScenarioTarget {
    pub fn position(p: Point) -> Self {
        Self {
            position: Some(p),
            ..Self::default()
        }
    }

    pub fn transform(t: Transform) -> Self {
        Self {
            transform: Some(t),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = Some(color);
        self
    }

    pub fn shown(mut self, is_shown: bool) -> Self {
        self.is_shown = Some(is_shown);
        self
    }

    fn touches_transform(&self) -> bool {
        self.transform.is_some()
            || self.position.is_some()
            || self.rotation.is_some()
            || self.scale.is_some()
    }

    /// Concrete values for `element`.
    pub fn resolve(&self, element: &Element) -> ResolvedScenario {
        let transform = self.touches_transform().then(|| {
            let mut t = self.transform.clone().unwrap_or_else(|| element.transform.clone());
            if let Some(p) = self.position {
                t.update_translation(p, None);
            }
            if let Some(r) = self.rotation {
                t.update_rotation(r, None);
            }
            if let Some(s) = self.scale {
                t.update_scale(s, None);
            }
            t
        });
        ResolvedScenario {
            transform,
            color: self.color,
            opacity: self.opacity,
            is_shown: self.is_shown,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedScenario {
    pub transform: Option<Transform>,
    pub color: Option<Rgba>,
    pub opacity: Option<f64>,
    pub is_shown: Option<bool>,
}

impl ResolvedScenario {
    /// What the element looks like right now. Opacity is only reported when not 1.
    pub fn current(element: &Element) -> Self {
        Self {
            transform: Some(element.transform.clone()),
            color: Some(element.color),
            opacity: (element.opacity != 1.0).then_some(element.opacity),
            is_shown: Some(element.is_shown),
        }
    }

    fn is_empty(&self) -> bool {
        self.transform.is_none()
            && self.color.is_none()
            && self.opacity.is_none()
            && self.is_shown.is_none()
    }
}

/// A scenario given inline or by name from the element's `scenarios`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ScenarioRef {
    Named(String),
    Target(ScenarioTarget),
}

impl From<ScenarioTarget> for ScenarioRef {
    fn from(t: ScenarioTarget) -> Self {
        Self::Target(t)
    }
}

impl From<&str> for ScenarioRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_owned())
    }
}

/// Per-property speeds. Missing transform components default to 1 unit per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScenarioVelocity {
    pub translation: Option<f64>,
    pub rotation: Option<f64>,
    pub scale: Option<f64>,
    pub color: Option<f64>,
    pub opacity: Option<f64>,
}

impl ScenarioVelocity {
    pub fn translation(v: f64) -> Self {
        Self {
            translation: Some(v),
            ..Self::default()
        }
    }

    fn transform(&self) -> TransformVelocity {
        TransformVelocity {
            translation: self.translation.unwrap_or(1.0),
            rotation: self.rotation.unwrap_or(1.0),
            scale: self.scale.unwrap_or(1.0),
        }
    }
}

/// Animate several properties of one element to a target state in parallel.
///
/// The child steps are built when the step starts, from the element's state at that moment.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScenarioStep {
    pub start: Option<ScenarioRef>,
    pub target: Option<ScenarioRef>,
    /// Derive durations from speeds instead of using the step duration.
    pub velocity: Option<ScenarioVelocity>,
    pub max_duration: Option<f64>,
    /// Durations at or below this snap to 0.
    pub zero_duration_threshold: f64,
    pub all_durations_same: bool,
    pub direction: RotDirection,
    pub clip_to: Option<ClipAngle>,
    pub(crate) steps: Vec<AnimationStep>,
}

impl Default for ScenarioStep {
    fn default() -> Self {
        Self {
            start: None,
            target: None,
            velocity: None,
            max_duration: None,
            zero_duration_threshold: 0.0,
            all_durations_same: true,
            direction: RotDirection::Shortest,
            clip_to: None,
            steps: Vec::new(),
        }
    }
}

impl ScenarioStep {
    pub fn to(target: impl Into<ScenarioRef>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn from(mut self, start: impl Into<ScenarioRef>) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn with_velocity(mut self, velocity: ScenarioVelocity) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn max_duration(mut self, seconds: f64) -> Self {
        self.max_duration = Some(seconds);
        self
    }

    pub fn zero_duration_threshold(mut self, seconds: f64) -> Self {
        self.zero_duration_threshold = seconds;
        self
    }

    pub fn all_durations_same(mut self, same: bool) -> Self {
        self.all_durations_same = same;
        self
    }

    pub fn direction(mut self, direction: RotDirection) -> Self {
        self.direction = direction;
        self
    }

    fn lookup(reference: &ScenarioRef, element: &Element) -> ResolvedScenario {
        match reference {
            ScenarioRef::Target(t) => t.resolve(element),
            ScenarioRef::Named(name) => match element.scenarios.get(name) {
                Some(t) => t.resolve(element),
                None => {
                    tracing::warn!(element = %element.name, scenario = %name, "unknown scenario");
                    ResolvedScenario::default()
                }
            },
        }
    }

    /// `[transform, color, opacity]` durations.
    fn durations(
        &self,
        start: &ResolvedScenario,
        target: &ResolvedScenario,
        duration: f64,
    ) -> [f64; 3] {
        let Some(velocity) = self.velocity else {
            return [duration; 3];
        };
        let mut transform = match (&start.transform, &target.transform) {
            (Some(s), Some(t)) => {
                max_time_from_velocity(s, t, &velocity.transform(), self.direction)
                    .unwrap_or_else(|err| {
                        tracing::warn!(
                            %err,
                            "scenario start and target transforms differ in shape"
                        );
                        0.0
                    })
            }
            _ => 0.0,
        };
        let mut color = match (start.color, target.color) {
            (Some(s), Some(t)) if s != t => s.max_delta(t) / velocity.color.unwrap_or(1.0),
            _ => 0.0,
        };
        let opacity_velocity = velocity.opacity.unwrap_or(1.0);
        let mut opacity = match (start.is_shown, target.is_shown, start.opacity) {
            (Some(_), Some(true), Some(o)) => (1.0 - o) / opacity_velocity,
            (Some(_), Some(false), Some(o)) => o / opacity_velocity,
            (Some(s), Some(t), None) if s != t => 1.0 / opacity_velocity,
            _ => 0.0,
        };
        for d in [&mut transform, &mut color, &mut opacity] {
            if let Some(max) = self.max_duration {
                *d = d.min(max);
            }
            if *d <= self.zero_duration_threshold {
                *d = 0.0;
            }
            *d = d.max(duration);
        }
        if self.all_durations_same {
            let longest = transform.max(color).max(opacity);
            return [longest; 3];
        }
        [transform, color, opacity]
    }

    /// Build the child steps for `element` from its current state.
    pub(crate) fn build(
        &mut self,
        element: ElementId,
        duration: f64,
        delay: f64,
        progression: Progression,
        tree: &ElementTree,
    ) -> Vec<AnimationStep> {
        let Some(el) = tree.get(element) else {
            return Vec::new();
        };
        let mut target = self
            .target
            .as_ref()
            .map(|r| Self::lookup(r, el))
            .unwrap_or_default();
        if target.is_empty() {
            target = ResolvedScenario::current(el);
        }
        let mut start = self
            .start
            .as_ref()
            .map(|r| Self::lookup(r, el))
            .unwrap_or_default();
        if start.is_empty() {
            start = ResolvedScenario::current(el);
        }

        let dissolve = match (start.is_shown, target.is_shown, start.opacity) {
            (Some(false), Some(true), None) => Some((Dissolve::In, false)),
            (_, Some(true), Some(_)) => Some((Dissolve::In, true)),
            (Some(true), Some(false), None) => Some((Dissolve::Out, false)),
            (_, Some(false), Some(_)) => Some((Dissolve::Out, true)),
            _ => None,
        };

        let [transform_duration, color_duration, opacity_duration] =
            self.durations(&start, &target, duration);
        let child = |step: AnimationStep, d: f64| {
            step.on(element)
                .with_duration(d)
                .with_delay(delay)
                .with_progression(progression)
        };

        let mut steps = Vec::new();
        if let Some(target_transform) = target.transform {
            steps.push(child(
                AnimationStep::transform(TransformStep {
                    start: start.transform,
                    target: Some(target_transform),
                    direction: self.direction,
                    clip_to: self.clip_to,
                    ..TransformStep::default()
                }),
                transform_duration,
            ));
        }
        if let Some(target_color) = target.color {
            steps.push(child(
                AnimationStep::color(ColorStep {
                    start: start.color,
                    ..ColorStep::to(target_color)
                }),
                color_duration,
            ));
        }
        if let Some((dissolve, from_current)) = dissolve {
            steps.push(child(
                AnimationStep::opacity(OpacityStep {
                    dissolve: Some(dissolve),
                    dissolve_from_current: from_current,
                    ..OpacityStep::default()
                }),
                opacity_duration,
            ));
        }
        steps
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/animation/steps/scenario.rs"]
mod tests;
