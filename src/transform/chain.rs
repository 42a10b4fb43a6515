use crate::foundation::core::{Affine, Point, RotDirection, Vec2};
use crate::foundation::error::{FigureError, FigureResult};
use crate::foundation::math::{ClipAngle, clip_angle, clip_mag, delta_angle, round};
use crate::foundation::tagged::Tagged;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentKind {
    Scale,
    Rotation,
    Translation,
}

impl ComponentKind {
    fn code(self) -> &'static str {
        match self {
            Self::Scale => "s",
            Self::Rotation => "r",
            Self::Translation => "t",
        }
    }
}

/// One typed operation of a [`Transform`] chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Component {
    Scale { x: f64, y: f64 },
    Rotation { r: f64 },
    Translation { x: f64, y: f64 },
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Scale { .. } => ComponentKind::Scale,
            Self::Rotation { .. } => ComponentKind::Rotation,
            Self::Translation { .. } => ComponentKind::Translation,
        }
    }

    pub fn affine(&self) -> Affine {
        match *self {
            Self::Scale { x, y } => Affine::scale_non_uniform(x, y),
            Self::Rotation { r } => Affine::rotate(r),
            Self::Translation { x, y } => Affine::translate((x, y)),
        }
    }

    /// Apply `f` to every scalar in the component.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        match *self {
            Self::Scale { x, y } => Self::Scale { x: f(x), y: f(y) },
            Self::Rotation { r } => Self::Rotation { r: f(r) },
            Self::Translation { x, y } => Self::Translation { x: f(x), y: f(y) },
        }
    }

    /// Combine with a component of the same kind value by value.
    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Option<Self> {
        match (*self, *other) {
            (Self::Scale { x, y }, Self::Scale { x: ox, y: oy }) => Some(Self::Scale {
                x: f(x, ox),
                y: f(y, oy),
            }),
            (Self::Rotation { r }, Self::Rotation { r: or }) => {
                Some(Self::Rotation { r: f(r, or) })
            }
            (Self::Translation { x, y }, Self::Translation { x: ox, y: oy }) => {
                Some(Self::Translation {
                    x: f(x, ox),
                    y: f(y, oy),
                })
            }
            _ => None,
        }
    }

    pub fn values(&self) -> Vec<f64> {
        match *self {
            Self::Scale { x, y } | Self::Translation { x, y } => vec![x, y],
            Self::Rotation { r } => vec![r],
        }
    }

    fn identity_of(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Scale => Self::Scale { x: 1.0, y: 1.0 },
            ComponentKind::Rotation => Self::Rotation { r: 0.0 },
            ComponentKind::Translation => Self::Translation { x: 0.0, y: 0.0 },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransformOp {
    pub component: Component,
    pub name: Option<String>,
}

/// Ordered chain of scale, rotation and translation operations.
///
/// Operations apply in the order they were appended, so `scale → rotate → translate` scales
/// first. Appending a parent's chain after a child's gives the child's figure transform.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Tagged<Vec<serde_json::Value>>", into = "Tagged<Vec<serde_json::Value>>")]
pub struct Transform {
    pub name: String,
    steps: Vec<TransformOp>,
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn from_components(components: impl IntoIterator<Item = Component>) -> Self {
        Self {
            name: String::new(),
            steps: components
                .into_iter()
                .map(|component| TransformOp {
                    component,
                    name: None,
                })
                .collect(),
        }
    }

    fn push(mut self, component: Component, name: Option<&str>) -> Self {
        self.steps.push(TransformOp {
            component,
            name: name.map(str::to_owned),
        });
        self
    }

    pub fn scale(self, x: f64, y: f64) -> Self {
        self.push(Component::Scale { x, y }, None)
    }

    pub fn scale_named(self, x: f64, y: f64, name: &str) -> Self {
        self.push(Component::Scale { x, y }, Some(name))
    }

    pub fn rotate(self, r: f64) -> Self {
        self.push(Component::Rotation { r }, None)
    }

    pub fn rotate_named(self, r: f64, name: &str) -> Self {
        self.push(Component::Rotation { r }, Some(name))
    }

    pub fn translate(self, x: f64, y: f64) -> Self {
        self.push(Component::Translation { x, y }, None)
    }

    pub fn translate_named(self, x: f64, y: f64, name: &str) -> Self {
        self.push(Component::Translation { x, y }, Some(name))
    }

    pub fn steps(&self) -> &[TransformOp] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Chain-append: `other`'s operations run after this chain's.
    pub fn transform(&self, other: &Transform) -> Transform {
        let mut out = self.clone();
        out.steps.extend(other.steps.iter().cloned());
        out
    }

    /// Fold the chain into one matrix, applying components in append order.
    pub fn matrix(&self) -> Affine {
        self.steps
            .iter()
            .fold(Affine::IDENTITY, |m, step| step.component.affine() * m)
    }

    fn find_index(&self, kind: ComponentKind, name: Option<&str>) -> Option<usize> {
        self.steps.iter().position(|s| {
            s.component.kind() == kind
                && match name {
                    Some(n) => s.name.as_deref() == Some(n),
                    None => true,
                }
        })
    }

    fn update(&mut self, component: Component, name: Option<&str>) -> bool {
        match self.find_index(component.kind(), name) {
            Some(i) => {
                self.steps[i].component = component;
                true
            }
            None => false,
        }
    }

    /// Replace the first (or the named) translation. Returns `false` when there is none.
    pub fn update_translation(&mut self, p: Point, name: Option<&str>) -> bool {
        self.update(Component::Translation { x: p.x, y: p.y }, name)
    }

    pub fn update_rotation(&mut self, r: f64, name: Option<&str>) -> bool {
        self.update(Component::Rotation { r }, name)
    }

    pub fn update_scale(&mut self, s: Vec2, name: Option<&str>) -> bool {
        self.update(Component::Scale { x: s.x, y: s.y }, name)
    }

    pub fn t(&self) -> Option<Point> {
        self.t_named(None)
    }

    pub fn r(&self) -> Option<f64> {
        self.r_named(None)
    }

    pub fn s(&self) -> Option<Vec2> {
        self.s_named(None)
    }

    pub fn t_named(&self, name: Option<&str>) -> Option<Point> {
        let i = self.find_index(ComponentKind::Translation, name)?;
        match self.steps[i].component {
            Component::Translation { x, y } => Some(Point::new(x, y)),
            _ => None,
        }
    }

    pub fn r_named(&self, name: Option<&str>) -> Option<f64> {
        let i = self.find_index(ComponentKind::Rotation, name)?;
        match self.steps[i].component {
            Component::Rotation { r } => Some(r),
            _ => None,
        }
    }

    pub fn s_named(&self, name: Option<&str>) -> Option<Vec2> {
        let i = self.find_index(ComponentKind::Scale, name)?;
        match self.steps[i].component {
            Component::Scale { x, y } => Some(Vec2::new(x, y)),
            _ => None,
        }
    }

    /// Same component kinds in the same order.
    pub fn is_equal_shape_to(&self, other: &Transform) -> bool {
        self.steps.len() == other.steps.len()
            && self
                .steps
                .iter()
                .zip(&other.steps)
                .all(|(a, b)| a.component.kind() == b.component.kind())
    }

    fn zip(
        &self,
        other: &Transform,
        op: &str,
        f: impl Fn(f64, f64) -> f64,
    ) -> FigureResult<Transform> {
        if !self.is_equal_shape_to(other) {
            return Err(FigureError::validation(format!(
                "cannot {op} transforms of different shape: '{}' and '{}'",
                self.shape_string(),
                other.shape_string()
            )));
        }
        let steps = self
            .steps
            .iter()
            .zip(&other.steps)
            .map(|(a, b)| TransformOp {
                component: a.component.zip_with(&b.component, &f).unwrap_or(a.component),
                name: a.name.clone(),
            })
            .collect();
        Ok(Transform {
            name: self.name.clone(),
            steps,
        })
    }

    fn shape_string(&self) -> String {
        self.steps
            .iter()
            .map(|s| s.component.kind().code())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn sub(&self, other: &Transform) -> FigureResult<Transform> {
        self.zip(other, "subtract", |a, b| a - b)
    }

    pub fn add(&self, other: &Transform) -> FigureResult<Transform> {
        self.zip(other, "add", |a, b| a + b)
    }

    pub fn mul(&self, other: &Transform) -> FigureResult<Transform> {
        self.zip(other, "multiply", |a, b| a * b)
    }

    /// `self + delta * factor`, component by component.
    pub fn add_scaled(&self, delta: &Transform, factor: f64) -> FigureResult<Transform> {
        self.zip(delta, "add", |a, d| a + d * factor)
    }

    /// Difference from `self` to `target`, with rotations taken in `direction`.
    pub fn delta_to(&self, target: &Transform, direction: RotDirection) -> FigureResult<Transform> {
        let mut delta = target.sub(self)?;
        for (i, step) in delta.steps.iter_mut().enumerate() {
            if let (Component::Rotation { r: start }, Component::Rotation { r: end }) =
                (self.steps[i].component, target.steps[i].component)
            {
                step.component = Component::Rotation {
                    r: delta_angle(start, end, direction),
                };
            }
        }
        Ok(delta)
    }

    fn map(&self, f: impl Fn(&Component) -> Component) -> Transform {
        Transform {
            name: self.name.clone(),
            steps: self
                .steps
                .iter()
                .map(|s| TransformOp {
                    component: f(&s.component),
                    name: s.name.clone(),
                })
                .collect(),
        }
    }

    pub fn constant(&self, value: f64) -> Transform {
        self.map(|c| c.map(|_| value))
    }

    pub fn zero(&self) -> Transform {
        self.constant(0.0)
    }

    pub fn identity(&self) -> Transform {
        self.map(|c| Component::identity_of(c.kind()))
    }

    pub fn is_zero(&self, threshold: f64) -> bool {
        self.steps
            .iter()
            .all(|s| s.component.values().iter().all(|v| v.abs() <= threshold))
    }

    pub fn round(&self, precision: u32) -> Transform {
        self.map(|c| c.map(|v| round(v, precision)))
    }

    pub fn is_equal_to(&self, other: &Transform, precision: u32) -> bool {
        self.round(precision).values_equal(&other.round(precision))
    }

    pub fn is_within_delta(&self, other: &Transform, delta: f64) -> bool {
        self.is_equal_shape_to(other)
            && self.steps.iter().zip(&other.steps).all(|(a, b)| {
                a.component
                    .values()
                    .iter()
                    .zip(b.component.values())
                    .all(|(x, y)| (x - y).abs() <= delta)
            })
    }

    fn values_equal(&self, other: &Transform) -> bool {
        self.is_equal_shape_to(other)
            && self
                .steps
                .iter()
                .zip(&other.steps)
                .all(|(a, b)| a.component == b.component)
    }

    /// Zero small values and cap magnitudes. Translations clip as a vector.
    pub fn clip_mag(&self, zero_threshold: f64, max: Option<f64>) -> Transform {
        self.map(|c| match *c {
            Component::Translation { x, y } => {
                let v = Vec2::new(x, y);
                let mag = v.hypot();
                let clipped = clip_mag(mag, zero_threshold, max);
                if mag == 0.0 {
                    Component::Translation { x: 0.0, y: 0.0 }
                } else {
                    let scaled = v * (clipped / mag);
                    Component::Translation {
                        x: scaled.x,
                        y: scaled.y,
                    }
                }
            }
            other => other.map(|v| clip_mag(v, zero_threshold, max)),
        })
    }

    /// Per-component rate of change from `previous` over `dt` seconds.
    pub fn velocity(
        &self,
        previous: &Transform,
        dt: f64,
        zero_threshold: f64,
        max: Option<f64>,
    ) -> FigureResult<Transform> {
        let delta = self.sub(previous)?;
        let v = delta.map(|c| c.map(|d| d / dt));
        Ok(Transform::from_components(v.steps.into_iter().map(|s| s.component))
            .clip_mag(zero_threshold, max))
    }

    /// Replace component values in order, keeping step names. Extra values are ignored.
    pub fn set_components(&mut self, components: Vec<Component>) {
        for (step, component) in self.steps.iter_mut().zip(components) {
            step.component = component;
        }
    }

    /// Wrap every rotation into `range`.
    pub fn clip_rotation(&mut self, range: ClipAngle) {
        for step in &mut self.steps {
            if let Component::Rotation { r } = step.component {
                step.component = Component::Rotation {
                    r: clip_angle(r, range),
                };
            }
        }
    }
}

impl From<Transform> for Tagged<Vec<serde_json::Value>> {
    fn from(t: Transform) -> Self {
        let mut state = vec![serde_json::Value::from(t.name.clone())];
        for step in &t.steps {
            let mut def = vec![serde_json::Value::from(step.component.kind().code())];
            def.extend(step.component.values().into_iter().map(serde_json::Value::from));
            if let Some(name) = &step.name {
                def.push(serde_json::Value::from(name.clone()));
            }
            state.push(serde_json::Value::Array(def));
        }
        Tagged::new("tf", state)
    }
}

impl TryFrom<Tagged<Vec<serde_json::Value>>> for Transform {
    type Error = String;

    fn try_from(tagged: Tagged<Vec<serde_json::Value>>) -> Result<Self, Self::Error> {
        let state = tagged.expect_tag("tf")?;
        let mut iter = state.into_iter();
        let name = match iter.next() {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => return Err(format!("transform name must be a string, found {other}")),
        };
        let mut t = Transform::named(name);
        for def in iter {
            let serde_json::Value::Array(items) = def else {
                return Err(format!("transform component must be an array, found {def}"));
            };
            let code = items.first().and_then(|v| v.as_str()).unwrap_or_default();
            let nums: Vec<f64> = items.iter().skip(1).filter_map(|v| v.as_f64()).collect();
            let step_name = items.iter().skip(1).find_map(|v| v.as_str());
            let component = match (code, nums.as_slice()) {
                ("s", [x, y, ..]) => Component::Scale { x: *x, y: *y },
                ("r", [r, ..]) => Component::Rotation { r: *r },
                ("t", [x, y, ..]) => Component::Translation { x: *x, y: *y },
                _ => return Err(format!("unknown transform component '{code}'")),
            };
            t = t.push(component, step_name);
        }
        Ok(t)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/chain.rs"]
mod tests;
