use std::f64::consts::{PI, TAU};

use crate::foundation::core::{Point, Rgba, Vec2};

/// Round `value` to `precision` decimal places. Negative zero comes back as `0.0`.
pub fn round(value: f64, precision: u32) -> f64 {
    let multiplier = 10f64.powi(precision as i32);
    let result = (value * multiplier).round() / multiplier;
    if result == 0.0 { 0.0 } else { result }
}

pub fn round_point(p: Point, precision: u32) -> Point {
    Point::new(round(p.x, precision), round(p.y, precision))
}

/// Zero values within `zero_threshold`, then clamp the magnitude to `max`.
pub fn clip_mag(value: f64, zero_threshold: f64, max: Option<f64>) -> f64 {
    let zero = zero_threshold.abs();
    let Some(max) = max.map(f64::abs) else {
        return value;
    };
    if value.abs() <= zero {
        return 0.0;
    }
    value.clamp(-max, max)
}

pub fn clip_value(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let mut v = value;
    if let Some(min) = min {
        v = v.max(min);
    }
    if let Some(max) = max {
        v = v.min(max);
    }
    v
}

/// Range an angle is wrapped into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClipAngle {
    /// `[0, 2π)`
    ZeroTo360,
    /// `[-π, π)`
    Minus180To180,
}

pub fn clip_angle(angle: f64, range: ClipAngle) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    match range {
        ClipAngle::ZeroTo360 => wrapped,
        ClipAngle::Minus180To180 => {
            if wrapped >= PI {
                wrapped - TAU
            } else {
                wrapped
            }
        }
    }
}

/// Signed angle to rotate from `start` to `target` in the given direction.
pub fn delta_angle(start: f64, target: f64, direction: crate::RotDirection) -> f64 {
    use crate::RotDirection;

    if direction == RotDirection::Direct {
        return target - start;
    }
    let diff = clip_angle(target, ClipAngle::ZeroTo360) - clip_angle(start, ClipAngle::ZeroTo360);
    if diff == 0.0 {
        return 0.0;
    }
    match direction {
        RotDirection::AntiClockwise => {
            if diff < 0.0 {
                diff + TAU
            } else {
                diff
            }
        }
        RotDirection::Clockwise => {
            if diff > 0.0 {
                diff - TAU
            } else {
                diff
            }
        }
        _ => {
            if diff.abs() > PI {
                -diff.signum() * (TAU - diff.abs())
            } else {
                diff
            }
        }
    }
}

/// `bias + mag * sin(2π·frequency·t + phase)`
pub fn sinusoid(t: f64, frequency: f64, bias: f64, mag: f64, phase: f64) -> f64 {
    bias + mag * (t * frequency * TAU + phase).sin()
}

/// Interpolation contract for animated value types.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with normalized factor `t`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Point {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        *a + (*b - *a) * t
    }
}

impl Lerp for Rgba {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Rgba::new(
            f64::lerp(&a.r, &b.r, t),
            f64::lerp(&a.g, &b.g, t),
            f64::lerp(&a.b, &b.b, t),
            f64::lerp(&a.a, &b.a, t),
        )
        .clamped()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
