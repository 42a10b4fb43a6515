use std::f64::consts::PI;

use super::*;

#[test]
fn translation_axes_are_timed_independently() {
    let s = Transform::new().translate(0.0, 0.0);
    let t = Transform::new().translate(1.0, 1.0);
    let velocity = TransformVelocity::uniform(1.0);
    let time = max_time_from_velocity(&s, &t, &velocity, RotDirection::Shortest).unwrap();
    assert!((time - 1.0).abs() < 1e-12);
}

#[test]
fn slowest_component_wins() {
    let s = Transform::new().scale(1.0, 1.0).rotate(0.0).translate(0.0, 0.0);
    let t = Transform::new().scale(3.0, 1.0).rotate(PI / 2.0).translate(0.5, 0.0);
    let v = TransformVelocity {
        translation: 1.0,
        rotation: PI,
        scale: 1.0,
    };
    let time = max_time_from_velocity(&s, &t, &v, RotDirection::Shortest).unwrap();
    assert!((time - 2.0).abs() < 1e-12);
}

#[test]
fn rotation_uses_direction() {
    let s = Transform::new().rotate(0.0);
    let t = Transform::new().rotate(1.5 * PI);
    let v = TransformVelocity::uniform(PI);
    let short = max_time_from_velocity(&s, &t, &v, RotDirection::Shortest).unwrap();
    let long = max_time_from_velocity(&s, &t, &v, RotDirection::AntiClockwise).unwrap();
    assert!((short - 0.5).abs() < 1e-9);
    assert!((long - 1.5).abs() < 1e-9);
}

#[test]
fn zero_velocity_is_ignored() {
    let s = Transform::new().translate(0.0, 0.0);
    let t = Transform::new().translate(5.0, 0.0);
    let velocity = TransformVelocity::uniform(0.0);
    let time = max_time_from_velocity(&s, &t, &velocity, RotDirection::Shortest).unwrap();
    assert_eq!(time, 0.0);
}

#[test]
fn velocity_transform_matches_shape() {
    let like = Transform::new().scale(1.0, 1.0).translate(0.0, 0.0);
    let v = TransformVelocity {
        translation: 2.0,
        rotation: 3.0,
        scale: 4.0,
    }
    .to_transform(&like);
    assert!(v.is_equal_shape_to(&like));
    assert_eq!(v.t(), Some(crate::Point::new(2.0, 2.0)));
}
