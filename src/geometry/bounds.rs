use crate::foundation::core::{Point, Rect, Vec2};
use crate::foundation::math::{clip_value, round};
use crate::transform::chain::{Component, Transform};

fn default_precision() -> u32 {
    8
}

/// Where a moving value or point meets its boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersect<P, D> {
    /// Boundary hit, `None` when the boundary is open in the travel direction.
    pub intersect: Option<P>,
    pub distance: f64,
    /// Direction of travel after bouncing.
    pub reflection: D,
}

/// One-dimensional bounds with optional ends.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RangeBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(default = "default_precision")]
    pub precision: u32,
}

impl RangeBounds {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min,
            max,
            precision: default_precision(),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    pub fn contains(&self, value: f64) -> bool {
        let v = round(value, self.precision);
        self.min.is_none_or(|min| v >= round(min, self.precision))
            && self.max.is_none_or(|max| v <= round(max, self.precision))
    }

    pub fn clip(&self, value: f64) -> f64 {
        clip_value(value, self.min, self.max)
    }

    /// Boundary reached travelling from `value` in the sign of `direction`.
    pub fn intersect(&self, value: f64, direction: f64) -> Intersect<f64, f64> {
        let v = self.clip(value);
        let (bound, reflection) = if direction >= 0.0 {
            (self.max, -1.0)
        } else {
            (self.min, 1.0)
        };
        match bound {
            Some(b) => Intersect {
                intersect: Some(b),
                distance: (v - b).abs(),
                reflection,
            },
            None => Intersect {
                intersect: None,
                distance: 0.0,
                reflection: direction.signum(),
            },
        }
    }
}

/// Axis-aligned 2D bounds. Any edge may be open.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RectBounds {
    pub left: Option<f64>,
    pub bottom: Option<f64>,
    pub right: Option<f64>,
    pub top: Option<f64>,
    #[serde(default = "default_precision")]
    pub precision: u32,
}

impl RectBounds {
    pub fn new(
        left: Option<f64>,
        bottom: Option<f64>,
        right: Option<f64>,
        top: Option<f64>,
    ) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
            precision: default_precision(),
        }
    }

    pub fn from_rect(r: Rect) -> Self {
        Self::new(Some(r.x0), Some(r.y0), Some(r.x1), Some(r.y1))
    }

    fn x_range(&self) -> RangeBounds {
        RangeBounds {
            min: self.left,
            max: self.right,
            precision: self.precision,
        }
    }

    fn y_range(&self) -> RangeBounds {
        RangeBounds {
            min: self.bottom,
            max: self.top,
            precision: self.precision,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.x_range().is_defined() || self.y_range().is_defined()
    }

    pub fn contains(&self, p: Point) -> bool {
        self.x_range().contains(p.x) && self.y_range().contains(p.y)
    }

    pub fn clip(&self, p: Point) -> Point {
        Point::new(self.x_range().clip(p.x), self.y_range().clip(p.y))
    }

    /// First wall hit travelling from `p` along unit `direction`.
    pub fn intersect(&self, p: Point, direction: Vec2) -> Intersect<Point, Vec2> {
        let p = self.clip(p);
        let wall = |pos: f64, d: f64, lo: Option<f64>, hi: Option<f64>| -> Option<f64> {
            if d > 0.0 {
                hi.map(|h| (h - pos) / d)
            } else if d < 0.0 {
                lo.map(|l| (l - pos) / d)
            } else {
                None
            }
        };
        let tx = wall(p.x, direction.x, self.left, self.right);
        let ty = wall(p.y, direction.y, self.bottom, self.top);

        let (distance, reflection) = match (tx, ty) {
            (None, None) => {
                return Intersect {
                    intersect: None,
                    distance: 0.0,
                    reflection: direction,
                };
            }
            (Some(t), None) => (t, Vec2::new(-direction.x, direction.y)),
            (None, Some(t)) => (t, Vec2::new(direction.x, -direction.y)),
            (Some(x), Some(y)) if x < y => (x, Vec2::new(-direction.x, direction.y)),
            (Some(x), Some(y)) if y < x => (y, Vec2::new(direction.x, -direction.y)),
            (Some(x), Some(_)) => (x, -direction),
        };
        Intersect {
            intersect: Some(p + direction * distance),
            distance,
            reflection,
        }
    }
}

/// Which ends of a [`LineBounds`] are closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineEnds {
    /// Infinite line through both points.
    None,
    /// Closed at `p1`, open past `p2`.
    One,
    /// Segment between `p1` and `p2`.
    Both,
}

/// Constrain a point to a line, ray or segment.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LineBounds {
    pub p1: Point,
    pub p2: Point,
    pub ends: LineEnds,
    #[serde(default = "default_precision")]
    pub precision: u32,
}

impl LineBounds {
    pub fn new(p1: Point, p2: Point, ends: LineEnds) -> Self {
        Self {
            p1,
            p2,
            ends,
            precision: default_precision(),
        }
    }

    pub fn unit(&self) -> Vec2 {
        let d = self.p2 - self.p1;
        let len = d.hypot();
        if len == 0.0 { Vec2::ZERO } else { d / len }
    }

    fn param_of(&self, p: Point) -> f64 {
        (p - self.p1).dot(self.unit())
    }

    fn clip_param(&self, s: f64) -> f64 {
        let len = (self.p2 - self.p1).hypot();
        match self.ends {
            LineEnds::None => s,
            LineEnds::One => s.max(0.0),
            LineEnds::Both => s.clamp(0.0, len),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        let s = self.param_of(p);
        let on_line = self.p1 + self.unit() * s;
        round((p - on_line).hypot(), self.precision) == 0.0
            && round(self.clip_param(s) - s, self.precision) == 0.0
    }

    /// Nearest allowed point on the line.
    pub fn clip(&self, p: Point) -> Point {
        self.p1 + self.unit() * self.clip_param(self.param_of(p))
    }

    /// Component of `v` along the line.
    pub fn project(&self, v: Vec2) -> Vec2 {
        let u = self.unit();
        u * v.dot(u)
    }

    pub fn intersect(&self, p: Point, direction: Vec2) -> Intersect<Point, Vec2> {
        let p = self.clip(p);
        let along = self.project(direction);
        let dir = if along.hypot() == 0.0 {
            Vec2::ZERO
        } else {
            along / along.hypot()
        };
        let proj = dir.dot(self.unit());
        let open = Intersect {
            intersect: None,
            distance: 0.0,
            reflection: dir,
        };
        if self.ends == LineEnds::None || proj == 0.0 {
            return open;
        }
        if proj > 0.0 {
            if self.ends == LineEnds::Both {
                return Intersect {
                    intersect: Some(self.p2),
                    distance: (p - self.p2).hypot(),
                    reflection: -dir,
                };
            }
            return open;
        }
        Intersect {
            intersect: Some(self.p1),
            distance: (p - self.p1).hypot(),
            reflection: -dir,
        }
    }
}

/// Bounds for a translation.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "f1Type", content = "state")]
pub enum PointBounds {
    #[serde(rename = "rectBounds")]
    Rect(RectBounds),
    #[serde(rename = "lineBounds")]
    Line(LineBounds),
}

impl PointBounds {
    pub fn is_defined(&self) -> bool {
        match self {
            Self::Rect(r) => r.is_defined(),
            Self::Line(_) => true,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        match self {
            Self::Rect(r) => r.contains(p),
            Self::Line(l) => l.contains(p),
        }
    }

    pub fn clip(&self, p: Point) -> Point {
        match self {
            Self::Rect(r) => r.clip(p),
            Self::Line(l) => l.clip(p),
        }
    }

    pub fn intersect(&self, p: Point, direction: Vec2) -> Intersect<Point, Vec2> {
        match self {
            Self::Rect(r) => r.intersect(p, direction),
            Self::Line(l) => l.intersect(p, direction),
        }
    }

    /// Part of a velocity the bounds allow.
    pub fn project_velocity(&self, v: Vec2) -> Vec2 {
        match self {
            Self::Rect(_) => v,
            Self::Line(l) => l.project(v),
        }
    }
}

/// Bounds per component kind of an element transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransformBounds {
    pub translation: Option<PointBounds>,
    pub rotation: Option<RangeBounds>,
    pub scale: Option<RangeBounds>,
}

impl TransformBounds {
    pub fn translation(bounds: PointBounds) -> Self {
        Self {
            translation: Some(bounds),
            ..Self::default()
        }
    }

    /// Clip the first component of each bounded kind.
    pub fn clip(&self, transform: &Transform) -> Transform {
        let mut out = transform.clone();
        if let (Some(b), Some(t)) = (self.translation, out.t()) {
            out.update_translation(b.clip(t), None);
        }
        if let (Some(b), Some(r)) = (self.rotation, out.r()) {
            out.update_rotation(b.clip(r), None);
        }
        if let (Some(b), Some(s)) = (self.scale, out.s()) {
            out.update_scale(Vec2::new(b.clip(s.x), b.clip(s.y)), None);
        }
        out
    }

    pub fn contains(&self, transform: &Transform) -> bool {
        transform.steps().iter().all(|step| match step.component {
            Component::Translation { x, y } => {
                self.translation.is_none_or(|b| b.contains(Point::new(x, y)))
            }
            Component::Rotation { r } => self.rotation.is_none_or(|b| b.contains(r)),
            Component::Scale { x, y } => self.scale.is_none_or(|b| b.contains(x) && b.contains(y)),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/bounds.rs"]
mod tests;
