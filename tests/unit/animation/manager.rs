use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::animation::steps::motion::PositionStep;
use crate::{Element, GlobalAnimation, Point, Primitive, StopHow};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn setup() -> (Rc<GlobalAnimation>, ElementTree, ElementId) {
    let (global, _) = GlobalAnimation::manual();
    let mut tree = ElementTree::new(Rc::clone(&global));
    let root = tree.root();
    let square = Primitive::polygon(vec![
        Point::new(-0.5, -0.5),
        Point::new(0.5, -0.5),
        Point::new(0.5, 0.5),
    ]);
    let id = tree.add(root, Element::primitive("tri", square)).unwrap();
    (global, tree, id)
}

fn slide(x: f64) -> AnimationStep {
    AnimationStep::position(PositionStep::to(Point::new(x, 0.0)))
}

fn x_of(tree: &ElementTree, id: ElementId) -> f64 {
    tree.get(id).and_then(Element::position).unwrap().x
}

fn count_finished(tree: &ElementTree, id: ElementId) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    tree.get(id)
        .unwrap()
        .animations
        .notifications
        .add("finished", move |_| c.set(c.get() + 1), None);
    count
}

#[test]
fn unnamed_animations_get_generated_names() {
    let (_, mut tree, id) = setup();
    let a = tree.add_animation(id, slide(1.0));
    let b = tree.add_animation(id, slide(2.0).named("mine"));
    assert_eq!(a, "_auto_1");
    assert_eq!(b, "mine");
    let manager = &tree.get(id).unwrap().animations;
    assert_eq!(manager.animations.len(), 2);
    assert_eq!(manager.get("mine").and_then(|s| s.element), Some(id));
    assert!(!manager.is_animating());
}

#[test]
fn finished_fires_once_when_the_last_animation_ends() {
    let (_, mut tree, id) = setup();
    let finished = count_finished(&tree, id);
    tree.start_animation(id, slide(1.0), When::Now);
    tree.start_animation(id, slide(1.0).with_duration(2.0).named("long"), When::Now);
    assert_eq!(tree.get(id).unwrap().animations.state, ManagerState::Animating);

    assert_eq!(tree.animations_next_frame(id, 1.0), Some(-1.0));
    assert_eq!(finished.get(), 0);
    assert_eq!(tree.get(id).unwrap().animations.animations.len(), 1);

    tree.animations_next_frame(id, 2.0);
    assert_eq!(finished.get(), 1);
    let manager = &tree.get(id).unwrap().animations;
    assert_eq!(manager.state, ManagerState::Idle);
    assert!(manager.animations.is_empty());
    assert_eq!(tree.animations_next_frame(id, 3.0), None);
}

#[test]
fn zero_duration_start_announces_finished_at_once() {
    let (_, mut tree, id) = setup();
    let finished = count_finished(&tree, id);
    tree.start_animation(id, slide(4.0).with_duration(0.0), When::Now);
    assert_eq!(finished.get(), 1);
    assert!(approx(x_of(&tree, id), 4.0));
    assert!(!tree.get(id).unwrap().animations.is_animating());
}

#[test]
fn start_animations_starts_only_unstarted_ones() {
    let (_, mut tree, id) = setup();
    tree.add_animation(id, slide(1.0).named("a"));
    tree.add_animation(id, slide(1.0).named("b"));
    tree.start_animations(id, Some("a"), When::Now);
    let manager = &tree.get(id).unwrap().animations;
    assert!(manager.get("a").unwrap().is_active());
    assert!(!manager.get("b").unwrap().is_active());

    tree.start_animations(id, None, When::Now);
    assert!(tree.get(id).unwrap().animations.get("b").unwrap().is_active());
}

#[test]
fn cancel_all_spares_no_stop_animations() {
    let (_, mut tree, id) = setup();
    let keep = format!("{NO_STOP_PREFIX}spin");
    tree.start_animation(id, slide(1.0).named(keep.as_str()), When::Now);
    tree.start_animation(id, slide(1.0).named("plain"), When::Now);

    tree.cancel_all_animations(id, None);
    let manager = &tree.get(id).unwrap().animations;
    assert!(manager.get("plain").is_none());
    assert!(manager.get(&keep).unwrap().is_active());
    assert!(manager.is_animating());
}

#[test]
fn cancel_by_name_with_force_completes() {
    let (_, mut tree, id) = setup();
    tree.start_animation(id, slide(3.0).named("go"), When::Now);
    tree.cancel_animations(id, "go", Some(Force::Complete));
    assert!(approx(x_of(&tree, id), 3.0));
    assert!(tree.get(id).unwrap().animations.get("go").is_none());
}

#[test]
fn speed_must_be_positive() {
    let (_, mut tree, id) = setup();
    assert!(matches!(
        tree.set_animation_speed(id, 0.0),
        Err(FigureError::Validation(_))
    ));
    assert!(tree.set_animation_speed(id, -1.0).is_err());
    assert!(tree.set_animation_speed(id, f64::NAN).is_err());
    tree.set_animation_speed(id, 2.0).unwrap();
    assert!(approx(tree.get(id).unwrap().animations.animation_speed, 2.0));
}

#[test]
fn speed_scales_elapsed_time() {
    let (_, mut tree, id) = setup();
    tree.set_animation_speed(id, 2.0).unwrap();
    tree.start_animation(id, slide(1.0), When::Now);
    tree.animations_next_frame(id, 0.25);
    assert!(approx(x_of(&tree, id), 0.5));
}

#[test]
fn pause_holds_and_unpause_resumes_where_it_was() {
    let (global, mut tree, id) = setup();
    tree.start_animation(id, slide(1.0), When::Now);
    global.frame(0.25);
    tree.animations_next_frame(id, 0.25);
    assert!(approx(x_of(&tree, id), 0.25));

    tree.pause_animations(id);
    let manager = &tree.get(id).unwrap().animations;
    assert!(manager.is_paused());
    assert!(!manager.is_animating());

    global.frame(1.0);
    assert_eq!(tree.animations_next_frame(id, 1.25), None);
    assert!(approx(x_of(&tree, id), 0.25));

    tree.unpause_animations(id);
    assert_eq!(tree.get(id).unwrap().animations.state, ManagerState::Animating);
    tree.animations_next_frame(id, 1.5);
    assert!(approx(x_of(&tree, id), 0.5));
}

#[test]
fn remaining_and_next_finish_times() {
    let (_, mut tree, id) = setup();
    tree.start_animation(id, slide(1.0), When::Now);
    tree.start_animation(id, slide(1.0).with_duration(3.0), When::Now);
    assert!(approx(tree.get_remaining_animation_time(id, 0.5), 2.5));
    let manager = &tree.get(id).unwrap().animations;
    assert_eq!(manager.get_next_animation_finish_time(0.5), Some(0.5));
    assert!(approx(manager.get_total_duration(), 3.0));
    assert!(approx(manager.get_remaining_time(&["_auto_1"], 0.5), 0.5));
}

#[test]
fn animations_added_while_draining_are_dropped() {
    let (_, mut tree, id) = setup();
    tree.start_animation(id, slide(1.0), When::Now);
    tree.stop(id, StopHow::AnimateToComplete);
    assert!(tree.is_preparing_to_stop(id));

    let name = tree.add_animation(id, slide(5.0).named("late"));
    assert_eq!(name, "late");
    assert!(tree.get(id).unwrap().animations.get("late").is_none());
}

#[test]
fn manager_snapshot_skips_notifications() {
    let (_, mut tree, id) = setup();
    tree.start_animation(id, slide(1.0).named("go"), When::Now);
    let manager = &tree.get(id).unwrap().animations;
    let json = serde_json::to_value(manager).unwrap();
    assert_eq!(json["state"], "animating");
    assert!(json.get("notifications").is_none());
    let back: AnimationManager = serde_json::from_value(json).unwrap();
    assert!(back.get("go").is_some());
    assert!(approx(back.animation_speed, 1.0));
}
