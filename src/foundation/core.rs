pub use kurbo::{Affine, Point, Rect, Vec2};

/// Straight (non-premultiplied) RGBA color with channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const DIM: Self = Self::new(0.5, 0.5, 0.5, 1.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn channels(self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    pub fn clamped(self) -> Self {
        Self::from(self.channels().map(|c| c.clamp(0.0, 1.0)))
    }

    /// Largest absolute per-channel difference to `other`.
    pub fn max_delta(self, other: Self) -> f64 {
        self.channels()
            .iter()
            .zip(other.channels())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    pub fn is_within_delta(self, other: Self, delta: f64) -> bool {
        self.max_delta(other) <= delta
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f64; 4]> for Rgba {
    fn from(c: [f64; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Rgba> for [f64; 4] {
    fn from(c: Rgba) -> Self {
        c.channels()
    }
}

/// When a step or animation should consider itself started.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum When {
    /// Current scheduler time.
    Now,
    /// Time of the last completed draw.
    PrevFrame,
    /// Bind lazily on the next frame the step sees.
    #[default]
    NextFrame,
    /// Scheduler time cached for ~100ms so sibling starts line up.
    SyncNow,
    /// Absolute time in seconds.
    At(f64),
}

/// How an element, animation or figure should stop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopHow {
    Freeze,
    #[default]
    Cancel,
    Complete,
    AnimateToComplete,
    DissolveToComplete,
}

/// Override for what a cancelled step does with its property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Force {
    Freeze,
    Complete,
}

/// Coordinate spaces an element's bounds can be reported in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Space {
    /// Vertex space, before the element's own transform.
    Draw,
    /// The element's own transform applied (parent space).
    Local,
    /// All ancestor transforms applied.
    Figure,
    /// Figure limits mapped onto `[-1, 1]`.
    Gl,
    /// Canvas pixels, y pointing down.
    Pixel,
}

/// Direction a rotation takes between two angles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RotDirection {
    /// Take the shorter way round.
    #[default]
    Shortest,
    /// Always increase the angle.
    AntiClockwise,
    /// Always decrease the angle.
    Clockwise,
    /// Plain difference, no wrapping.
    Direct,
}

/// Figure-level pixel canvas size.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 500.0,
            height: 500.0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
