use crate::animation::steps::{Interpolate, applies_now, velocity_duration};
use crate::element::node::ElementId;
use crate::element::tree::ElementTree;
use crate::foundation::core::{Rgba, When};
use crate::foundation::math::Lerp;

/// Alpha a dissolve fades from or to. Never exactly zero so the element keeps drawing.
pub const DISSOLVED: f64 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dissolve {
    In,
    Out,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorTarget {
    Color(Rgba),
    /// The element's `dim_color`.
    Dim,
    /// The element's `default_color`.
    Undim,
}

/// Animate the element color.
///
/// Explicit colors also become the element's default color; dim and undim leave it alone.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorStep {
    pub start: Option<Rgba>,
    pub target: Option<ColorTarget>,
    pub delta: Option<Rgba>,
    pub dissolve: Option<Dissolve>,
    /// Largest channel change per second.
    pub velocity: Option<f64>,
    pub max_duration: Option<f64>,
    pub(crate) bound_target: Option<Rgba>,
    pub(crate) when_complete: Option<Rgba>,
}

impl ColorStep {
    pub fn to(target: Rgba) -> Self {
        Self {
            target: Some(ColorTarget::Color(target)),
            ..Self::default()
        }
    }

    pub fn dim() -> Self {
        Self {
            target: Some(ColorTarget::Dim),
            ..Self::default()
        }
    }

    pub fn undim() -> Self {
        Self {
            target: Some(ColorTarget::Undim),
            ..Self::default()
        }
    }

    pub fn dissolve(mut self, dissolve: Dissolve) -> Self {
        self.dissolve = Some(dissolve);
        self
    }

    fn sets_default(&self) -> bool {
        !matches!(self.target, Some(ColorTarget::Dim | ColorTarget::Undim))
    }

    fn set(&self, element: ElementId, color: Rgba, tree: &mut ElementTree) {
        if self.sets_default() {
            tree.set_default_color(element, color);
        } else {
            tree.set_color(element, color);
        }
    }
}

impl Interpolate for ColorStep {
    fn bind(&mut self, element: ElementId, when: When, tree: &mut ElementTree) -> Option<f64> {
        let Some(el) = tree.get(element) else {
            return Some(0.0);
        };
        let current = el.color;
        let resolved_target = match self.target {
            Some(ColorTarget::Color(c)) => Some(c),
            Some(ColorTarget::Dim) => Some(el.dim_color),
            Some(ColorTarget::Undim) => Some(el.default_color),
            None => None,
        };
        let mut start = match self.start {
            Some(s) => {
                if applies_now(when) {
                    self.set(element, s, tree);
                }
                s
            }
            None => current,
        };
        let mut target = match (self.delta, resolved_target) {
            (Some(d), _) => Rgba::new(
                (start.r + d.r).min(1.0),
                (start.g + d.g).min(1.0),
                (start.b + d.b).min(1.0),
                (start.a + d.a).min(1.0),
            ),
            (None, Some(t)) => t,
            (None, None) => start,
        };
        self.when_complete = Some(target);
        match self.dissolve {
            Some(Dissolve::Out) => target.a = DISSOLVED,
            Some(Dissolve::In) => {
                start.a = DISSOLVED;
                self.set(element, start, tree);
                tree.show_all(element);
            }
            None => {}
        }
        self.start = Some(start);
        self.bound_target = Some(target);
        velocity_duration(start.max_delta(target), self.velocity, self.max_duration)
    }

    fn apply(&self, element: ElementId, progress: f64, tree: &mut ElementTree) {
        if let (Some(start), Some(target)) = (self.start, self.bound_target) {
            self.set(element, Rgba::lerp(&start, &target, progress).clamped(), tree);
        }
    }

    fn apply_end(&self, element: ElementId, tree: &mut ElementTree) {
        if let Some(end) = self.when_complete {
            self.set(element, end, tree);
        }
        if self.dissolve == Some(Dissolve::Out) {
            tree.hide(element);
        }
    }
}

/// Animate the element opacity, multiplied into every descendant.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OpacityStep {
    pub start: Option<f64>,
    pub target: Option<f64>,
    pub delta: Option<f64>,
    pub dissolve: Option<Dissolve>,
    /// Dissolve from the current opacity rather than from fully shown or hidden.
    pub dissolve_from_current: bool,
    pub velocity: Option<f64>,
    pub max_duration: Option<f64>,
    pub(crate) bound_target: Option<f64>,
    pub(crate) when_complete: Option<f64>,
}

impl OpacityStep {
    pub fn to(target: f64) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn dissolve_in() -> Self {
        Self {
            dissolve: Some(Dissolve::In),
            ..Self::default()
        }
    }

    pub fn dissolve_out() -> Self {
        Self {
            dissolve: Some(Dissolve::Out),
            ..Self::default()
        }
    }
}

impl Interpolate for OpacityStep {
    fn bind(&mut self, element: ElementId, when: When, tree: &mut ElementTree) -> Option<f64> {
        let Some(el) = tree.get(element) else {
            return Some(0.0);
        };
        let (current, shown) = (el.opacity, el.is_shown);
        let mut start = match self.start {
            Some(s) => {
                if applies_now(when) {
                    tree.set_opacity(element, s);
                }
                s
            }
            None => current,
        };
        let mut target = match (self.delta, self.target) {
            (Some(d), _) => start + d,
            (None, Some(t)) => t,
            (None, None) => start,
        };
        let mut when_complete = target;
        match self.dissolve {
            Some(Dissolve::Out) => {
                start = if self.dissolve_from_current && shown { current } else { 1.0 };
                target = DISSOLVED;
                when_complete = 1.0;
                tree.set_opacity(element, start);
            }
            Some(Dissolve::In) => {
                start = if self.dissolve_from_current && shown { current } else { DISSOLVED };
                target = 1.0;
                when_complete = 1.0;
                tree.show_all(element);
                tree.set_opacity(element, start);
            }
            None => {}
        }
        self.start = Some(start);
        self.bound_target = Some(target);
        self.when_complete = Some(when_complete);
        velocity_duration(target - start, self.velocity, self.max_duration)
    }

    fn apply(&self, element: ElementId, progress: f64, tree: &mut ElementTree) {
        if let (Some(start), Some(target)) = (self.start, self.bound_target) {
            tree.set_opacity(element, f64::lerp(&start, &target, progress).clamp(0.0, 1.0));
        }
    }

    fn apply_end(&self, element: ElementId, tree: &mut ElementTree) {
        if let Some(end) = self.when_complete {
            tree.set_opacity(element, end);
        }
        if self.dissolve == Some(Dissolve::Out) {
            tree.hide(element);
        }
    }
}

impl OpacityStep {
    /// A dissolve cut short at its faded end leaves the element hidden at full opacity.
    pub(crate) fn cancelled_without_end(&self, element: ElementId, tree: &mut ElementTree) {
        if tree.get(element).is_some_and(|e| e.opacity == DISSOLVED) {
            tree.hide(element);
            tree.set_opacity(element, 1.0);
        }
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/animation/steps/color.rs"]
mod tests;
