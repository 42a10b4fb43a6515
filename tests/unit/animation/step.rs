use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::animation::callback::finish_fn;
use crate::animation::steps::motion::RotationStep;
use crate::{Element, GlobalAnimation, Point, Primitive};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn approx_pt(a: Point, b: Point) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y)
}

fn square_tree() -> (ElementTree, ElementId) {
    let (global, _) = GlobalAnimation::manual();
    let mut tree = ElementTree::new(global);
    let root = tree.root();
    let square = Primitive::polygon(vec![
        Point::new(-0.5, -0.5),
        Point::new(0.5, -0.5),
        Point::new(0.5, 0.5),
        Point::new(-0.5, 0.5),
    ]);
    let id = tree.add(root, Element::primitive("square", square)).unwrap();
    (tree, id)
}

fn position(tree: &ElementTree, id: ElementId) -> Point {
    tree.get(id).and_then(Element::position).unwrap()
}

fn move_to(x: f64, y: f64) -> AnimationStep {
    AnimationStep::position(PositionStep::to(Point::new(x, y)))
}

#[test]
fn leaf_interpolates_linearly_and_finishes_at_target() {
    let (mut tree, id) = square_tree();
    let mut step = move_to(2.0, 0.0).on(id);
    step.start(When::Now, &mut tree);
    assert_eq!(step.state, StepState::Animating);
    assert_eq!(step.start_time, Some(0.0));

    let remaining = step.next_frame(0.25, 1.0, &mut tree);
    assert!(approx(remaining, -0.75));
    assert!(approx_pt(position(&tree, id), Point::new(0.5, 0.0)));

    let remaining = step.next_frame(1.2, 1.0, &mut tree);
    assert!(approx(remaining, 0.2));
    assert!(step.is_finished());
    assert!(approx_pt(position(&tree, id), Point::new(2.0, 0.0)));
}

#[test]
fn next_frame_start_binds_on_first_frame() {
    let (mut tree, id) = square_tree();
    let mut step = move_to(1.0, 0.0).on(id);
    step.start(When::NextFrame, &mut tree);
    assert_eq!(step.start_time, None);

    step.next_frame(3.0, 1.0, &mut tree);
    assert_eq!(step.start_time, Some(3.0));
    assert!(approx_pt(position(&tree, id), Point::ZERO));

    step.next_frame(3.5, 1.0, &mut tree);
    assert!(approx_pt(position(&tree, id), Point::new(0.5, 0.0)));
}

#[test]
fn delay_holds_the_start_value() {
    let (mut tree, id) = square_tree();
    let mut step = move_to(1.0, 0.0).with_delay(0.5).on(id);
    step.start(When::Now, &mut tree);

    let remaining = step.next_frame(0.25, 1.0, &mut tree);
    assert!(approx(remaining, -1.25));
    assert!(approx_pt(position(&tree, id), Point::ZERO));

    step.next_frame(1.0, 1.0, &mut tree);
    assert!(approx_pt(position(&tree, id), Point::new(0.5, 0.0)));
}

#[test]
fn zero_duration_snaps_without_a_frame() {
    let (mut tree, id) = square_tree();
    let mut step = move_to(1.0, 1.0).with_duration(0.0).on(id);
    step.start(When::Now, &mut tree);
    step.finish_if_zero_duration(&mut tree);
    assert!(step.is_finished());
    assert!(approx_pt(position(&tree, id), Point::new(1.0, 1.0)));
}

#[test]
fn cancel_freezes_unless_completion_is_asked_for() {
    let (mut tree, id) = square_tree();
    let mut frozen = move_to(1.0, 0.0).on(id);
    frozen.start(When::Now, &mut tree);
    frozen.next_frame(0.5, 1.0, &mut tree);
    frozen.cancel(None, &mut tree);
    assert!(frozen.is_finished());
    assert!(approx_pt(position(&tree, id), Point::new(0.5, 0.0)));

    let mut forced = move_to(0.0, 2.0).on(id);
    forced.start(When::Now, &mut tree);
    forced.next_frame(0.1, 1.0, &mut tree);
    forced.cancel(Some(Force::Complete), &mut tree);
    assert!(approx_pt(position(&tree, id), Point::new(0.0, 2.0)));

    let mut configured = move_to(3.0, 0.0).complete_on_cancel(true).on(id);
    configured.start(When::Now, &mut tree);
    configured.cancel(None, &mut tree);
    assert!(approx_pt(position(&tree, id), Point::new(3.0, 0.0)));

    let mut overridden = move_to(5.0, 5.0).complete_on_cancel(true).on(id);
    overridden.start(When::Now, &mut tree);
    overridden.cancel(Some(Force::Freeze), &mut tree);
    assert!(approx_pt(position(&tree, id), Point::new(3.0, 0.0)));
}

#[test]
fn finish_callback_runs_once_with_the_cancel_flag() {
    let (mut tree, id) = square_tree();
    let calls = Rc::new(Cell::new(0));
    let cancelled = Rc::new(Cell::new(false));
    let (c, k) = (Rc::clone(&calls), Rc::clone(&cancelled));
    let mut step = move_to(1.0, 0.0)
        .when_finished(finish_fn(move |_, was_cancelled| {
            c.set(c.get() + 1);
            k.set(was_cancelled);
        }))
        .on(id);
    step.start(When::Now, &mut tree);
    step.cancel(None, &mut tree);
    step.cancel(None, &mut tree);
    step.next_frame(5.0, 1.0, &mut tree);
    assert_eq!(calls.get(), 1);
    assert!(cancelled.get());
}

#[test]
fn serial_overshoot_carries_into_the_next_step() {
    let (mut tree, id) = square_tree();
    let mut serial = AnimationStep::serial(vec![move_to(1.0, 0.0), move_to(1.0, 1.0)]).on(id);
    serial.start(When::Now, &mut tree);

    let remaining = serial.next_frame(1.5, 1.0, &mut tree);
    assert!(approx(remaining, -0.5));
    assert!(approx_pt(position(&tree, id), Point::new(1.0, 0.5)));
    assert_eq!(serial.children()[1].start_time, Some(1.0));

    serial.next_frame(2.0, 1.0, &mut tree);
    assert!(serial.is_finished());
    assert!(approx_pt(position(&tree, id), Point::new(1.0, 1.0)));
}

#[test]
fn serial_skips_zero_duration_children_on_start() {
    let (mut tree, id) = square_tree();
    let mut serial = AnimationStep::serial(vec![
        move_to(1.0, 0.0).with_duration(0.0),
        move_to(1.0, 1.0),
    ])
    .on(id);
    serial.start(When::Now, &mut tree);
    assert!(serial.children()[0].is_finished());
    assert!(approx_pt(position(&tree, id), Point::new(1.0, 0.0)));
    assert_eq!(serial.children()[1].state, StepState::Animating);
}

#[test]
fn parallel_runs_until_the_longest_child_ends() {
    let (mut tree, id) = square_tree();
    let mut parallel = AnimationStep::parallel(vec![
        move_to(1.0, 0.0),
        AnimationStep::rotation(RotationStep::to(1.0)).with_duration(2.0),
    ])
    .on(id);
    parallel.start(When::Now, &mut tree);
    assert!(approx(parallel.get_total_duration(), 2.0));

    let remaining = parallel.next_frame(1.0, 1.0, &mut tree);
    assert!(approx(remaining, -1.0));
    assert!(parallel.children()[0].is_finished());
    assert!(!parallel.is_finished());

    parallel.next_frame(2.0, 1.0, &mut tree);
    assert!(parallel.is_finished());
    let r = tree.get(id).and_then(|e| e.transform.r()).unwrap();
    assert!(approx(r, 1.0));
}

#[test]
fn group_delay_moves_into_children() {
    let (mut tree, id) = square_tree();
    let mut serial = AnimationStep::serial(vec![move_to(1.0, 0.0)])
        .with_delay(0.5)
        .on(id);
    assert!(approx(serial.get_total_duration(), 1.5));
    serial.start(When::Now, &mut tree);
    assert!(approx(serial.delay, 0.0));
    assert!(approx(serial.children()[0].delay, 0.5));
    assert!(approx(serial.get_total_duration(), 1.5));
}

#[test]
fn remaining_time_counts_down_from_the_total() {
    let (mut tree, id) = square_tree();
    let mut step = move_to(1.0, 0.0).with_duration(2.0).on(id);
    assert!(approx(step.get_remaining_time(0.0), 0.0));
    step.start(When::NextFrame, &mut tree);
    assert!(approx(step.get_remaining_time(10.0), 2.0));
    step.next_frame(0.0, 1.0, &mut tree);
    assert!(approx(step.get_remaining_time(0.5), 1.5));
}

#[test]
fn speed_change_keeps_progress_continuous() {
    let (mut tree, id) = square_tree();
    let mut step = move_to(1.0, 0.0).on(id);
    step.start(When::Now, &mut tree);
    step.next_frame(0.5, 1.0, &mut tree);

    step.set_time_speed(1.0, 2.0, 0.5);
    step.next_frame(0.5, 2.0, &mut tree);
    assert!(approx_pt(position(&tree, id), Point::new(0.5, 0.0)));

    step.next_frame(0.625, 2.0, &mut tree);
    assert!(approx_pt(position(&tree, id), Point::new(0.75, 0.0)));
}

#[test]
fn time_delta_shifts_or_unbinds() {
    let (mut tree, id) = square_tree();
    let mut serial = AnimationStep::serial(vec![move_to(1.0, 0.0)]).on(id);
    serial.start(When::At(1.0), &mut tree);
    serial.set_time_delta(Some(2.0));
    assert_eq!(serial.start_time, Some(3.0));
    assert_eq!(serial.children()[0].start_time, Some(3.0));
    serial.set_time_delta(None);
    assert_eq!(serial.start_time, None);
    assert_eq!(serial.children()[0].start_time, None);
}

#[test]
fn finished_steps_never_restart() {
    let (mut tree, id) = square_tree();
    let mut step = move_to(1.0, 0.0).with_duration(0.0).on(id);
    step.start(When::Now, &mut tree);
    step.finish_if_zero_duration(&mut tree);
    tree.set_position(id, Point::ZERO);
    step.start(When::Now, &mut tree);
    assert!(step.is_finished());
    assert!(approx_pt(position(&tree, id), Point::ZERO));
}

#[test]
fn find_searches_children_by_name() {
    let step = AnimationStep::serial(vec![
        move_to(1.0, 0.0).named("first"),
        AnimationStep::parallel(vec![move_to(0.0, 0.0).named("inner")]),
    ])
    .named("outer");
    assert!(step.find("outer").is_some());
    assert!(step.find("inner").is_some());
    assert!(step.find("missing").is_none());
}

#[test]
fn snapshot_tags_the_variant() {
    let (_, id) = square_tree();
    let step = move_to(1.0, 2.0).named("slide").on(id);
    let json = serde_json::to_value(&step).unwrap();
    assert_eq!(json["f1Type"], "positionAnimationStep");
    assert_eq!(json["name"], "slide");
    assert_eq!(json["element"]["f1Type"], "de");

    let back: AnimationStep = serde_json::from_value(json).unwrap();
    assert_eq!(back.kind.type_name(), "position");
    assert_eq!(back.element, Some(id));
}
