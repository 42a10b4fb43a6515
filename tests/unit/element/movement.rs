use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::animation::steps::motion::ScaleStep;
use crate::{AnimationStep, Element, GlobalAnimation, Primitive, Vec2, When};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn triangle() -> Primitive {
    Primitive::polygon(vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(0.0, 1.0),
    ])
}

fn setup(config: MoveConfig) -> (Rc<GlobalAnimation>, ElementTree, ElementId) {
    let (global, _) = GlobalAnimation::manual();
    let mut tree = ElementTree::new(Rc::clone(&global));
    let root = tree.root();
    let id = tree
        .add(root, Element::primitive("mover", triangle()).movable().with_move_config(config))
        .unwrap();
    (global, tree, id)
}

fn counter(tree: &ElementTree, id: ElementId, topic: &str) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    tree.get(id)
        .unwrap()
        .notifications
        .add(topic, move |_| c.set(c.get() + 1), None);
    count
}

fn x_of(tree: &ElementTree, id: ElementId) -> f64 {
    tree.get(id).unwrap().position().unwrap().x
}

/// Drag from the origin to `(0.1, 0)` over 0.1 s.
fn drag(global: &GlobalAnimation, tree: &mut ElementTree, id: ElementId) {
    tree.start_being_moved(id);
    global.frame(0.1);
    let mut next = tree.get(id).unwrap().transform.clone();
    next.update_translation(Point::new(0.1, 0.0), None);
    tree.moved(id, next);
}

#[test]
fn transform_bounds_clip_every_set() {
    let bounds = TransformBounds::translation(PointBounds::Rect(RectBounds::new(
        Some(-1.0),
        Some(-1.0),
        Some(1.0),
        Some(1.0),
    )));
    let (_, mut tree, id) = setup(MoveConfig {
        bounds: MoveBounds::Transform(bounds),
        ..MoveConfig::default()
    });
    tree.set_position(id, Point::new(2.0, 0.5));
    assert_eq!(tree.get(id).unwrap().position(), Some(Point::new(1.0, 0.5)));
}

#[test]
fn figure_bounds_follow_the_limits() {
    let (_, mut tree, id) = setup(MoveConfig {
        bounds: MoveBounds::Figure,
        ..MoveConfig::default()
    });
    tree.set_position(id, Point::new(3.0, -3.0));
    assert_eq!(tree.get(id).unwrap().position(), Some(Point::new(1.0, -1.0)));
}

#[test]
fn size_in_bounds_keeps_the_whole_shape_inside() {
    let (_, mut tree, id) = setup(MoveConfig {
        bounds: MoveBounds::Figure,
        size_in_bounds: true,
        ..MoveConfig::default()
    });
    tree.set_position(id, Point::new(5.0, 5.0));
    assert_eq!(tree.get(id).unwrap().position(), Some(Point::new(0.0, 0.0)));
    tree.set_position(id, Point::new(-5.0, -5.0));
    assert_eq!(tree.get(id).unwrap().position(), Some(Point::new(-1.0, -1.0)));
}

#[test]
fn dragging_records_velocity() {
    let (global, mut tree, id) = setup(MoveConfig::default());
    let started = counter(&tree, id, "startBeingMoved");
    drag(&global, &mut tree, id);

    assert_eq!(started.get(), 1);
    let el = tree.get(id).unwrap();
    assert!(el.movement.is_being_moved);
    assert!(close(el.position().unwrap().x, 0.1));
    let v = el.movement.velocity.t().unwrap();
    assert!(close(v.x, 1.0));
    assert!(close(v.y, 0.0));
}

#[test]
fn drag_velocity_is_capped() {
    let (global, mut tree, id) = setup(MoveConfig {
        max_velocity: 0.5,
        ..MoveConfig::default()
    });
    drag(&global, &mut tree, id);
    let v = tree.get(id).unwrap().movement.velocity.t().unwrap();
    assert!(close(v.x, 0.5));
}

#[test]
fn free_motion_decelerates_to_rest() {
    let (global, mut tree, id) = setup(MoveConfig::default());
    let stopped = counter(&tree, id, "stopMovingFreely");
    drag(&global, &mut tree, id);
    tree.start_moving_freely(id);

    let el = tree.get(id).unwrap();
    assert!(el.movement.is_moving_freely);
    assert!(!el.movement.is_being_moved);
    let remaining = tree.get_remaining_moving_freely_time(id).unwrap();
    assert!((remaining - 0.2).abs() < 1e-3);

    let root = tree.root();
    tree.setup_draw(root, 0.2);
    let midway = x_of(&tree, id);
    assert!(midway > 0.1 && midway < 0.2);
    assert_eq!(stopped.get(), 0);

    tree.setup_draw(root, 0.5);
    assert!(close(x_of(&tree, id), 0.2));
    assert_eq!(stopped.get(), 1);
    let el = tree.get(id).unwrap();
    assert!(!el.movement.is_moving_freely);
    assert!(el.movement.velocity.is_zero(0.0));
    assert_eq!(tree.get_remaining_moving_freely_time(id), None);
}

#[test]
fn free_motion_ends_when_the_remaining_time_runs_out() {
    let (global, mut tree, id) = setup(MoveConfig::default());
    drag(&global, &mut tree, id);
    tree.start_moving_freely(id);
    let start = tree.now();
    let end = start + tree.get_remaining_moving_freely_time(id).unwrap();

    let root = tree.root();
    let frame = 1.0 / 60.0;
    let mut now = start;
    while now + frame < end - frame {
        now += frame;
        tree.setup_draw(root, now);
        assert!(tree.get(id).unwrap().movement.is_moving_freely, "stopped at {now}");
    }
    tree.setup_draw(root, end - frame);
    assert!(tree.get(id).unwrap().movement.is_moving_freely);

    tree.setup_draw(root, end);
    assert!(!tree.get(id).unwrap().movement.is_moving_freely);
    assert!(close(x_of(&tree, id), 0.2));
}

#[test]
fn completing_free_motion_jumps_to_rest() {
    let (global, mut tree, id) = setup(MoveConfig::default());
    drag(&global, &mut tree, id);
    tree.start_moving_freely(id);
    tree.stop_moving_freely(id, StopHow::Complete);
    assert!(close(x_of(&tree, id), 0.2));
    assert!(!tree.get(id).unwrap().movement.is_moving_freely);
}

#[test]
fn freezing_free_motion_stays_put() {
    let (global, mut tree, id) = setup(MoveConfig::default());
    drag(&global, &mut tree, id);
    tree.start_moving_freely(id);
    tree.stop_moving_freely(id, StopHow::Freeze);
    assert!(close(x_of(&tree, id), 0.1));
}

#[test]
fn bounded_free_motion_bounces_off_the_wall() {
    let bounds = TransformBounds::translation(PointBounds::Rect(RectBounds::new(
        None,
        None,
        Some(0.15),
        None,
    )));
    let config = MoveConfig {
        bounds: MoveBounds::Transform(bounds),
        freely: FreelyConfig {
            bounce_loss: 1.0,
            ..FreelyConfig::default()
        },
        ..MoveConfig::default()
    };
    let (global, mut tree, id) = setup(config);
    drag(&global, &mut tree, id);
    tree.start_moving_freely(id);
    tree.stop_moving_freely(id, StopHow::Complete);
    assert!(close(x_of(&tree, id), 0.15));
}

#[test]
fn stale_release_drops_the_velocity() {
    let (global, mut tree, id) = setup(MoveConfig::default());
    drag(&global, &mut tree, id);
    global.frame(0.2);
    tree.stop_being_moved(id);
    let el = tree.get(id).unwrap();
    assert!(!el.movement.is_being_moved);
    assert!(el.movement.velocity.is_zero(0.0));
}

#[test]
fn new_drag_freezes_running_animations() {
    let (_, mut tree, id) = setup(MoveConfig::default());
    tree.start_animation(
        id,
        AnimationStep::scale(ScaleStep::to(Vec2::new(2.0, 2.0))),
        When::Now,
    );
    tree.start_being_moved(id);
    let el = tree.get(id).unwrap();
    assert!(!el.animations.is_animating());
    assert_eq!(el.transform.s(), Some(Vec2::new(1.0, 1.0)));
}
