use super::*;

#[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
struct Holder {
    #[serde(with = "point")]
    p: Point,
    #[serde(with = "opt_point")]
    q: Option<Point>,
    #[serde(with = "rect")]
    r: Rect,
}

#[test]
fn tagged_fields_use_f1_type_names() {
    let h = Holder {
        p: Point::new(1.0, 2.0),
        q: None,
        r: Rect::new(-1.0, -1.0, 1.0, 1.0),
    };
    let v = serde_json::to_value(&h).unwrap();
    assert_eq!(v["p"], serde_json::json!({"f1Type": "p", "state": [1.0, 2.0]}));
    assert_eq!(v["q"], serde_json::Value::Null);
    assert_eq!(
        v["r"],
        serde_json::json!({"f1Type": "rect", "state": [-1.0, -1.0, 2.0, 2.0]})
    );
    let back: Holder = serde_json::from_value(v).unwrap();
    assert_eq!(back, h);
}

#[test]
fn wrong_tag_is_rejected() {
    let v = serde_json::json!({
        "p": {"f1Type": "tf", "state": [1.0, 2.0]},
        "q": null,
        "r": {"f1Type": "rect", "state": [0.0, 0.0, 1.0, 1.0]},
    });
    let err = serde_json::from_value::<Holder>(v).unwrap_err();
    assert!(err.to_string().contains("expected f1Type 'p'"));
}
