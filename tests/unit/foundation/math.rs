use std::f64::consts::PI;

use super::*;
use crate::RotDirection;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn round_strips_negative_zero() {
    assert_eq!(round(-0.000_000_001, 8), 0.0);
    assert!(round(-0.000_000_001, 8).is_sign_positive());
    assert_eq!(round(1.234_567_891, 3), 1.235);
}

#[test]
fn clip_mag_zeroes_and_caps() {
    assert_eq!(clip_mag(0.00005, 0.0001, Some(5.0)), 0.0);
    assert_eq!(clip_mag(7.0, 0.0001, Some(5.0)), 5.0);
    assert_eq!(clip_mag(-7.0, 0.0001, Some(-5.0)), -5.0);
    assert_eq!(clip_mag(7.0, 0.0001, None), 7.0);
}

#[test]
fn clip_value_respects_open_ends() {
    assert_eq!(clip_value(3.0, None, Some(2.0)), 2.0);
    assert_eq!(clip_value(-3.0, Some(-1.0), None), -1.0);
    assert_eq!(clip_value(0.5, None, None), 0.5);
}

#[test]
fn clip_angle_ranges() {
    assert!(approx(clip_angle(-PI / 2.0, ClipAngle::ZeroTo360), 1.5 * PI));
    assert!(approx(clip_angle(1.5 * PI, ClipAngle::Minus180To180), -PI / 2.0));
}

#[test]
fn delta_angle_directions() {
    let s = 0.1;
    let t = 2.0 * PI - 0.1;
    assert!(approx(delta_angle(s, t, RotDirection::Shortest), -0.2));
    assert!(approx(delta_angle(s, t, RotDirection::AntiClockwise), 2.0 * PI - 0.2));
    assert!(approx(delta_angle(t, s, RotDirection::Clockwise), -(2.0 * PI - 0.2)));
    assert!(approx(delta_angle(0.0, 3.0 * PI, RotDirection::Direct), 3.0 * PI));
}

#[test]
fn sinusoid_peaks_at_quarter_period() {
    assert!(approx(sinusoid(0.25, 1.0, 1.0, 0.5, 0.0), 1.5));
    assert!(approx(sinusoid(0.0, 1.0, 1.0, 0.5, 0.0), 1.0));
}

#[test]
fn lerp_color_clamps_channels() {
    let a = Rgba::new(0.0, 0.0, 0.0, 1.0);
    let b = Rgba::new(1.0, 1.0, 1.0, 1.0);
    assert_eq!(Rgba::lerp(&a, &b, 0.5), Rgba::new(0.5, 0.5, 0.5, 1.0));
    assert_eq!(Rgba::lerp(&a, &b, 1.5), Rgba::new(1.0, 1.0, 1.0, 1.0));
}
