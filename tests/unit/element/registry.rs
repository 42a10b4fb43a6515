use serde_json::json;

use super::*;
use crate::GlobalAnimation;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn tree() -> ElementTree {
    let (global, _) = GlobalAnimation::manual();
    ElementTree::new(global)
}

fn definitions(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

#[test]
fn nested_definitions_build_the_tree() {
    let mut tree = tree();
    let root = tree.root();
    let defs = definitions(json!([
        {
            "name": "group",
            "make": "collection",
            "options": { "position": [1.0, 0.0] },
            "elements": [
                {
                    "name": "sq",
                    "make": "rectangle",
                    "options": { "width": 2.0, "color": [1.0, 0.0, 0.0, 1.0], "touchable": true }
                }
            ]
        },
        { "name": "tri", "method": "polygon", "options": { "sides": 3 } }
    ]));
    let added = tree.add_definitions(root, &defs, &ElementRegistry::default()).unwrap();
    assert_eq!(added.len(), 2);

    let group = tree.get_element("group").unwrap();
    assert_eq!(added[0], group);
    assert_eq!(tree.get(group).unwrap().position(), Some(Point::new(1.0, 0.0)));

    let sq = tree.get(tree.get_element("group.sq").unwrap()).unwrap();
    let border = &sq.as_primitive().unwrap().border;
    assert_eq!(border[0], Point::new(-1.0, -0.5));
    assert_eq!(border[2], Point::new(1.0, 0.5));
    assert_eq!(sq.color, Rgba::new(1.0, 0.0, 0.0, 1.0));
    assert_eq!(sq.default_color, sq.color);
    assert!(sq.is_touchable);
    assert!(!sq.is_movable);

    let tri = tree.get(tree.get_element("tri").unwrap()).unwrap();
    let points = &tri.as_primitive().unwrap().points;
    assert_eq!(points.len(), 3);
    assert!(approx(points[0].x, 1.0));
    assert!(approx(points[0].y, 0.0));
}

#[test]
fn errors_name_the_index_and_parent() {
    let mut tree = tree();
    let root = tree.root();
    let defs = definitions(json!([
        { "name": "ok", "make": "collection" },
        { "name": "bad", "make": "star" }
    ]));
    let err = tree
        .add_definitions(root, &defs, &ElementRegistry::default())
        .unwrap_err();
    assert!(matches!(err, FigureError::Config(_)));
    let msg = err.to_string();
    assert!(msg.contains("index 1"), "{msg}");
    assert!(msg.contains("figureRoot"), "{msg}");
    assert!(msg.contains("unknown element kind 'star'"), "{msg}");
    assert!(tree.get_element("ok").is_some());
}

#[test]
fn nested_errors_name_the_nested_collection() {
    let mut tree = tree();
    let root = tree.root();
    let defs = definitions(json!({
        "name": "group",
        "make": "collection",
        "elements": [{ "make": "polygon" }]
    }));
    let msg = tree
        .add_definitions(root, &defs, &ElementRegistry::default())
        .unwrap_err()
        .to_string();
    assert!(msg.contains("index 0 in collection 'group'"), "{msg}");
    assert!(msg.contains("missing name"), "{msg}");
}

#[test]
fn bad_options_are_rejected() {
    let mut tree = tree();
    let root = tree.root();
    let registry = ElementRegistry::default();

    let too_few = definitions(json!({ "name": "p", "make": "polygon", "options": { "sides": 2 } }));
    let msg = tree.add_definitions(root, &too_few, &registry).unwrap_err().to_string();
    assert!(msg.contains("at least 3 sides"), "{msg}");

    let wrong_type = definitions(json!({
        "name": "r",
        "make": "rectangle",
        "options": { "width": "wide" }
    }));
    assert!(tree.add_definitions(root, &wrong_type, &registry).is_err());

    let no_make = definitions(json!({ "name": "m" }));
    let msg = tree.add_definitions(root, &no_make, &registry).unwrap_err().to_string();
    assert!(msg.contains("missing make"), "{msg}");
}

#[test]
fn primitives_cannot_hold_children() {
    let mut tree = tree();
    let root = tree.root();
    let defs = definitions(json!({
        "name": "r",
        "make": "rectangle",
        "elements": [{ "name": "inner", "make": "rectangle" }]
    }));
    let msg = tree
        .add_definitions(root, &defs, &ElementRegistry::default())
        .unwrap_err()
        .to_string();
    assert!(msg.contains("cannot hold nested elements"), "{msg}");
}

#[test]
fn paths_place_definitions_in_existing_collections() {
    let mut tree = tree();
    let root = tree.root();
    let registry = ElementRegistry::default();
    let setup = definitions(json!([
        { "name": "a", "make": "collection", "elements": [{ "name": "b", "make": "collection" }] },
        { "name": "leaf", "make": "rectangle" }
    ]));
    tree.add_definitions(root, &setup, &registry).unwrap();

    let placed = definitions(json!({ "name": "c", "make": "rectangle", "path": "a.b" }));
    tree.add_definitions(root, &placed, &registry).unwrap();
    assert!(tree.get_element("a.b.c").is_some());

    let missing = definitions(json!({ "name": "d", "make": "rectangle", "path": "a.nope" }));
    let msg = tree.add_definitions(root, &missing, &registry).unwrap_err().to_string();
    assert!(msg.contains("path 'a.nope' is not a collection"), "{msg}");

    let leaf = definitions(json!({ "name": "e", "make": "rectangle", "path": "leaf" }));
    assert!(tree.add_definitions(root, &leaf, &registry).is_err());
}

#[test]
fn duplicate_names_surface_as_config_errors() {
    let mut tree = tree();
    let root = tree.root();
    let defs = definitions(json!([
        { "name": "x", "make": "rectangle" },
        { "name": "x", "make": "rectangle" }
    ]));
    let err = tree
        .add_definitions(root, &defs, &ElementRegistry::default())
        .unwrap_err();
    assert!(err.to_string().contains("index 1"));
}

#[test]
fn custom_factories_register_once() {
    let mut registry = ElementRegistry::default();
    registry
        .register("dot", |_| Ok(Element::primitive("", Primitive::polygon(vec![Point::ZERO; 3]))))
        .unwrap();
    assert!(registry.contains("dot"));
    assert!(matches!(
        registry.register("dot", |_| Ok(Element::collection(""))),
        Err(FigureError::Validation(_))
    ));
    assert!(registry.register("polygon", |_| Ok(Element::collection(""))).is_err());
    assert!(!ElementRegistry::empty().contains("polygon"));

    let mut tree = tree();
    let root = tree.root();
    let defs = definitions(json!({ "name": "d", "make": "dot" }));
    tree.add_definitions(root, &defs, &registry).unwrap();
    assert!(tree.get_element("d").is_some());
}

#[test]
fn scenario_is_applied_after_adding() {
    let mut tree = tree();
    let root = tree.root();
    let defs = definitions(json!({
        "name": "s",
        "make": "rectangle",
        "options": {
            "scenarios": {
                "away": { "isShown": false },
                "dim": { "color": [0.5, 0.5, 0.5, 1.0] }
            }
        },
        "scenario": "away"
    }));
    tree.add_definitions(root, &defs, &ElementRegistry::default()).unwrap();
    let el = tree.get(tree.get_element("s").unwrap()).unwrap();
    assert!(!el.is_shown);
    assert_eq!(el.scenarios.len(), 2);
}
