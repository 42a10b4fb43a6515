use super::*;

#[derive(serde::Serialize, serde::Deserialize)]
struct Holder {
    #[serde(with = "opt_callback", default)]
    on_finish: Option<Callback<FinishFn>>,
}

#[test]
fn named_callbacks_resolve_from_their_table() {
    let mut map = FunctionMap::default();
    map.add_trigger("go", |_, _| Some(2.0));
    assert!(map.resolve(&Callback::<TriggerFn>::named("go")).is_some());
    assert!(map.resolve(&Callback::<CustomFn>::named("go")).is_none());
    assert!(map.resolve(&Callback::<TriggerFn>::named("missing")).is_none());
}

#[test]
fn inline_callbacks_always_resolve() {
    let map = FunctionMap::default();
    assert!(map.resolve(&finish_fn(|_, _| {})).is_some());
}

#[test]
fn named_serializes_by_name_and_inline_as_null() {
    let named = Holder {
        on_finish: Some(Callback::named("done")),
    };
    assert_eq!(serde_json::to_value(&named).unwrap()["on_finish"], "done");

    let inline = Holder {
        on_finish: Some(finish_fn(|_, _| {})),
    };
    assert!(serde_json::to_value(&inline).unwrap()["on_finish"].is_null());

    let back: Holder = serde_json::from_str(r#"{"on_finish":"done"}"#).unwrap();
    assert!(matches!(back.on_finish, Some(Callback::Named(n)) if n == "done"));
    let none: Holder = serde_json::from_str("{}").unwrap();
    assert!(none.on_finish.is_none());
}
