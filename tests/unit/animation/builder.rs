use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::animation::callback::{finish_fn, trigger_fn};
use crate::{Element, GlobalAnimation, Point, Primitive, StepKind, StepState};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn setup() -> (ElementTree, ElementId) {
    let (global, _) = GlobalAnimation::manual();
    let mut tree = ElementTree::new(global);
    let root = tree.root();
    let shape = Primitive::polygon(vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(0.0, 1.0),
    ]);
    let id = tree.add(root, Element::primitive("shape", shape)).unwrap();
    (tree, id)
}

#[test]
fn build_makes_one_named_serial_step() {
    let (tree, id) = setup();
    let step = tree
        .animate(id)
        .named("intro")
        .position(PositionStep::to(Point::new(1.0, 0.0)), 1.0)
        .delay(0.5)
        .dissolve_out(0.25)
        .build();
    assert_eq!(step.name, "intro");
    assert_eq!(step.element, Some(id));
    assert!(matches!(step.kind, StepKind::Serial(_)));
    assert_eq!(step.children().len(), 3);
    assert!(step.children().iter().all(|c| c.element == Some(id)));
    assert_eq!(step.children()[2].complete_on_cancel, Some(true));
    assert!(approx(step.get_total_duration(), 1.75));
}

#[test]
fn chain_runs_its_links_in_order() {
    let (mut tree, id) = setup();
    tree.animate(id)
        .position(PositionStep::to(Point::new(1.0, 0.0)), 1.0)
        .delay(0.5)
        .rotation(RotationStep::to(1.0), 0.5)
        .start(&mut tree, When::Now);

    tree.animations_next_frame(id, 1.0);
    let el = tree.get(id).unwrap();
    assert!(approx(el.position().unwrap().x, 1.0));
    assert!(approx(el.transform.r().unwrap(), 0.0));

    tree.animations_next_frame(id, 1.75);
    assert!(approx(tree.get(id).unwrap().transform.r().unwrap(), 0.5));

    tree.animations_next_frame(id, 2.0);
    assert!(tree.get(id).unwrap().animations.animations.is_empty());
}

#[test]
fn add_queues_without_starting() {
    let (mut tree, id) = setup();
    let name = tree.animate(id).named("later").scale(ScaleStep::uniform(2.0), 1.0).add(&mut tree);
    assert_eq!(name, "later");
    let step = tree.get(id).unwrap().animations.get("later").unwrap();
    assert_eq!(step.state, StepState::Idle);
}

#[test]
fn cancelled_dissolve_still_hides() {
    let (mut tree, id) = setup();
    tree.animate(id).dissolve_out(1.0).start(&mut tree, When::Now);
    tree.animations_next_frame(id, 0.5);
    assert!(tree.get(id).unwrap().opacity < 1.0);

    tree.cancel_all_animations(id, None);
    let el = tree.get(id).unwrap();
    assert!(!el.is_shown);
    assert!(approx(el.opacity, 1.0));
}

#[test]
fn trigger_and_finish_callbacks_fire_once() {
    let (mut tree, id) = setup();
    let fired = Rc::new(Cell::new(0));
    let finished = Rc::new(Cell::new(0));
    let (f, d) = (Rc::clone(&fired), Rc::clone(&finished));
    tree.animate(id)
        .delay(0.2)
        .trigger(trigger_fn(move |_, _| {
            f.set(f.get() + 1);
            None
        }))
        .opacity(OpacityStep::to(0.5), 0.2)
        .when_finished(finish_fn(move |_, _| d.set(d.get() + 1)))
        .start(&mut tree, When::Now);

    tree.animations_next_frame(id, 0.1);
    assert_eq!(fired.get(), 0);
    tree.animations_next_frame(id, 0.3);
    assert_eq!(fired.get(), 1);
    tree.animations_next_frame(id, 1.0);
    assert_eq!(fired.get(), 1);
    assert_eq!(finished.get(), 1);
    assert!(approx(tree.get(id).unwrap().opacity, 0.5));
}

#[test]
fn in_parallel_runs_as_one_link() {
    let (mut tree, id) = setup();
    tree.animate(id)
        .in_parallel(vec![
            AnimationStep::position(PositionStep::to(Point::new(2.0, 0.0))),
            AnimationStep::color(ColorStep::dim()).with_duration(0.5),
        ])
        .start(&mut tree, When::Now);
    tree.animations_next_frame(id, 0.5);
    let el = tree.get(id).unwrap();
    assert!(approx(el.position().unwrap().x, 1.0));
    assert_eq!(el.color, el.dim_color);
}
