use super::*;
use crate::animation::steps::motion::PositionStep;
use crate::element::pulse::{PulseCenter, PulseOptions};
use crate::{AnimationStep, Element, GlobalAnimation, ManagerState, Point, Primitive, When};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn square(name: &str) -> Element {
    Element::primitive(
        name,
        Primitive::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]),
    )
}

fn setup() -> (ElementTree, ElementId) {
    let (global, _) = GlobalAnimation::manual();
    let mut tree = ElementTree::new(global);
    let root = tree.root();
    let group = tree.add(root, Element::collection("group")).unwrap();
    let sq = tree.add(group, square("sq")).unwrap();
    (tree, sq)
}

fn x_of(tree: &ElementTree, id: ElementId) -> f64 {
    tree.get(id).unwrap().position().unwrap().x
}

#[test]
fn json_round_trip_restores_the_tree() {
    let (mut tree, sq) = setup();
    tree.set_position(sq, Point::new(0.5, -0.5));
    tree.set_color(sq, Rgba::new(0.0, 1.0, 0.0, 1.0));
    tree.get_mut(sq).unwrap().copy_transforms = vec![Transform::new().translate(1.0, 0.0)];
    let state = FigureState::capture(&tree, 0.0).unwrap().with_duration(2.0);

    let value = state.to_value().unwrap();
    assert_eq!(value["stateTime"], 0.0);
    assert_eq!(value["duration"], 2.0);
    let sq_value = &value["elements"]["elements"]["group"]["elements"]["sq"];
    assert_eq!(sq_value["transform"]["f1Type"], "tf");
    assert!(sq_value.get("elements").is_none());

    tree.set_position(sq, Point::ZERO);
    tree.set_color(sq, Rgba::WHITE);
    tree.hide(sq);
    tree.get_mut(sq).unwrap().copy_transforms.clear();

    FigureState::from_value(value).unwrap().restore(&mut tree, 0.0).unwrap();
    let el = tree.get(sq).unwrap();
    assert_eq!(el.position(), Some(Point::new(0.5, -0.5)));
    assert_eq!(el.color, Rgba::new(0.0, 1.0, 0.0, 1.0));
    assert!(el.is_shown);
    assert_eq!(el.copy_transforms.len(), 1);
}

#[test]
fn restore_shifts_animation_clocks() {
    let (mut tree, sq) = setup();
    tree.start_animation(
        sq,
        AnimationStep::position(PositionStep::to(Point::new(1.0, 0.0))),
        When::Now,
    );
    tree.animations_next_frame(sq, 0.25);
    let state = FigureState::capture(&tree, 0.25).unwrap();

    tree.animations_next_frame(sq, 1.0);
    assert!(approx(x_of(&tree, sq), 1.0));
    assert!(!tree.get(sq).unwrap().animations.is_animating());

    state.restore(&mut tree, 1.25).unwrap();
    let manager = &tree.get(sq).unwrap().animations;
    assert_eq!(manager.state, ManagerState::Animating);
    assert!(approx(x_of(&tree, sq), 0.25));

    tree.animations_next_frame(sq, 1.5);
    assert!(approx(x_of(&tree, sq), 0.5));
    tree.animations_next_frame(sq, 2.0);
    assert!(approx(x_of(&tree, sq), 1.0));
}

#[test]
fn restore_shifts_pulse_clocks() {
    let (mut tree, sq) = setup();
    tree.pulse(sq, &PulseOptions {
        center: PulseCenter::Origin,
        when: When::Now,
        ..PulseOptions::default()
    });
    let state = tree.get_element_state(sq).unwrap();
    tree.set_element_state(sq, &state, 2.0).unwrap();
    assert_eq!(tree.get(sq).unwrap().pulse.start_time, Some(2.0));
}

#[test]
fn unknown_children_are_skipped() {
    let (mut tree, sq) = setup();
    tree.set_position(sq, Point::new(1.0, 0.0));
    let state = FigureState::capture(&tree, 0.0).unwrap();

    tree.remove(sq);
    let group = tree.get_element("group").unwrap();
    let other = tree.add(group, square("other")).unwrap();
    state.restore(&mut tree, 0.0).unwrap();
    assert_eq!(tree.get(other).unwrap().position(), Some(Point::new(0.0, 0.0)));
}

#[test]
fn children_under_a_primitive_are_an_error() {
    let (global, _) = GlobalAnimation::manual();
    let mut tree = ElementTree::new(global);
    let root = tree.root();
    let holder = tree.add(root, Element::collection("holder")).unwrap();
    tree.add(holder, square("inner")).unwrap();
    let state = FigureState::capture(&tree, 0.0).unwrap();

    tree.replace(root, square("holder")).unwrap();
    let err = state.restore(&mut tree, 0.0).unwrap_err();
    assert!(matches!(err, FigureError::State(_)));
    assert!(err.to_string().contains("holder"));
}

#[test]
fn element_state_covers_a_subtree() {
    let (tree, _) = setup();
    let group = tree.get_element("group").unwrap();
    let state = tree.get_element_state(group).unwrap();
    assert_eq!(state.elements.len(), 1);
    assert!(state.elements.contains_key("sq"));

    let pairs = state.pairs(&tree, group);
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].0, group);
}
