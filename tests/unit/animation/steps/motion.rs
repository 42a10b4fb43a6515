use std::f64::consts::TAU;

use super::*;
use crate::{AnimationStep, Element, GlobalAnimation, Primitive, StepKind};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn setup() -> (ElementTree, ElementId) {
    let (global, _) = GlobalAnimation::manual();
    let mut tree = ElementTree::new(global);
    let root = tree.root();
    let shape = Primitive::polygon(vec![
        Point::new(-1.0, -1.0),
        Point::new(1.0, -1.0),
        Point::new(0.0, 1.0),
    ]);
    let id = tree.add(root, Element::primitive("shape", shape)).unwrap();
    (tree, id)
}

fn run(tree: &mut ElementTree, id: ElementId, step: AnimationStep, at: f64) -> AnimationStep {
    let mut step = step.on(id);
    step.start(When::Now, tree);
    step.next_frame(at, 1.0, tree);
    step
}

#[test]
fn position_by_delta_moves_relative_to_start() {
    let (mut tree, id) = setup();
    tree.set_position(id, Point::new(1.0, 1.0));
    run(&mut tree, id, AnimationStep::position(PositionStep::by(Vec2::new(1.0, 2.0))), 0.5);
    let p = tree.get(id).unwrap().position().unwrap();
    assert!(approx(p.x, 1.5));
    assert!(approx(p.y, 2.0));
}

#[test]
fn position_start_applies_on_an_immediate_start() {
    let (mut tree, id) = setup();
    let from_left = PositionStep::to(Point::new(1.0, 0.0)).from(Point::new(-1.0, 0.0));
    let mut step = AnimationStep::position(from_left).on(id);
    step.start(When::Now, &mut tree);
    assert!(approx(tree.get(id).unwrap().position().unwrap().x, -1.0));

    let from_far_left = PositionStep::to(Point::new(1.0, 0.0)).from(Point::new(-3.0, 0.0));
    let mut deferred = AnimationStep::position(from_far_left).on(id);
    deferred.start(When::NextFrame, &mut tree);
    assert!(approx(tree.get(id).unwrap().position().unwrap().x, -1.0));
    deferred.next_frame(0.0, 1.0, &mut tree);
    assert!(approx(tree.get(id).unwrap().position().unwrap().x, -3.0));
}

#[test]
fn position_velocity_sets_the_duration() {
    let (mut tree, id) = setup();
    let fast = PositionStep::to(Point::new(2.0, -1.0)).with_velocity(4.0);
    let mut step = AnimationStep::position(fast).on(id);
    step.start(When::Now, &mut tree);
    assert!(approx(step.duration, 0.5));
}

#[test]
fn position_velocity_respects_max_duration() {
    let (mut tree, id) = setup();
    let payload = PositionStep {
        max_duration: Some(0.25),
        ..PositionStep::to(Point::new(2.0, 0.0)).with_velocity(1.0)
    };
    let mut step = AnimationStep::position(payload).on(id);
    step.start(When::Now, &mut tree);
    assert!(approx(step.duration, 0.25));
}

#[test]
fn rotation_follows_the_requested_direction() {
    let (mut tree, id) = setup();
    let step = run(
        &mut tree,
        id,
        AnimationStep::rotation(RotationStep::to(1.0).direction(RotDirection::Clockwise)),
        0.5,
    );
    let StepKind::Rotation(rotation) = &step.kind else {
        panic!("not a rotation step");
    };
    assert!(approx(rotation.delta.unwrap(), 1.0 - TAU));
    let r = tree.get(id).unwrap().transform.r().unwrap();
    assert!(approx(r, (1.0 - TAU) / 2.0));
}

#[test]
fn rotation_clips_each_frame() {
    let (mut tree, id) = setup();
    run(
        &mut tree,
        id,
        AnimationStep::rotation(RotationStep::by(-2.0).clip_to(ClipAngle::ZeroTo360)),
        0.5,
    );
    let r = tree.get(id).unwrap().transform.r().unwrap();
    assert!(approx(r, TAU - 1.0));
}

#[test]
fn scale_interpolates_both_axes() {
    let (mut tree, id) = setup();
    run(&mut tree, id, AnimationStep::scale(ScaleStep::to(Vec2::new(3.0, 2.0))), 0.5);
    let s = tree.get(id).unwrap().transform.s().unwrap();
    assert!(approx(s.x, 2.0));
    assert!(approx(s.y, 1.5));
}

#[test]
fn transform_step_moves_every_component() {
    let (mut tree, id) = setup();
    let target = Transform::new().scale(2.0, 2.0).rotate(1.0).translate(1.0, -1.0);
    run(&mut tree, id, AnimationStep::transform(TransformStep::to(target)), 0.5);
    let t = &tree.get(id).unwrap().transform;
    assert!(approx(t.s().unwrap().x, 1.5));
    assert!(approx(t.r().unwrap(), 0.5));
    assert!(approx(t.t().unwrap().y, -0.5));
}

#[test]
fn transform_step_with_velocity_uses_the_slowest_component() {
    let (mut tree, id) = setup();
    let target = Transform::new().scale(1.0, 1.0).rotate(0.0).translate(1.0, 0.0);
    let velocity = TransformVelocity {
        translation: 2.0,
        rotation: 1.0,
        scale: 1.0,
    };
    let step = TransformStep::to(target).with_velocity(velocity);
    let mut step = AnimationStep::transform(step).on(id);
    step.start(When::Now, &mut tree);
    assert!(approx(step.duration, 0.5));
}

#[test]
fn mismatched_transform_shapes_end_without_touching_the_element() {
    let (mut tree, id) = setup();
    let before = tree.get(id).unwrap().transform.clone();
    let far = TransformStep::to(Transform::new().translate(5.0, 5.0));
    let mut step = AnimationStep::transform(far).on(id);
    step.start(When::Now, &mut tree);
    step.finish_if_zero_duration(&mut tree);
    assert!(step.is_finished());
    assert_eq!(tree.get(id).unwrap().transform, before);
}
