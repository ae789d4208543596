use super::*;
use serde_json::json;

fn overrides(v: Value) -> JsonMap {
    match v {
        Value::Object(m) => m,
        other => panic!("overrides must be an object, got {other}"),
    }
}

fn fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("color", FieldKind::Color).with_default("#ffffff"),
        FieldSpec::new("rows", FieldKind::Integer).with_default(1),
        FieldSpec::new("ratio", FieldKind::Float).with_default(0.5),
        FieldSpec::new("utc", FieldKind::Boolean).with_default(false),
        FieldSpec::new("position", FieldKind::Select)
            .with_options(&["top-left", "center"])
            .with_default("center"),
        FieldSpec::new("note", FieldKind::Text),
    ]
}

#[test]
fn defaults_fill_missing_fields() {
    let cfg = resolve_config(&fields(), &JsonMap::new()).unwrap();
    assert_eq!(cfg.str("color").unwrap(), "#ffffff");
    assert_eq!(cfg.i64("rows").unwrap(), 1);
    assert_eq!(cfg.f64("ratio").unwrap(), 0.5);
    assert!(!cfg.bool("utc").unwrap());
    assert_eq!(cfg.str("position").unwrap(), "center");
    assert!(cfg.get("note").is_none());
}

#[test]
fn overrides_win_and_are_coerced() {
    let cfg = resolve_config(
        &fields(),
        &overrides(json!({
            "color": "#F00",
            "rows": "3",
            "ratio": "0.25",
            "utc": "true",
            "position": "top-left",
            "unknown": 42
        })),
    )
    .unwrap();
    assert_eq!(cfg.color("color").unwrap(), Color::rgba(255, 0, 0, 255));
    assert_eq!(cfg.i64("rows").unwrap(), 3);
    assert_eq!(cfg.f64("ratio").unwrap(), 0.25);
    assert!(cfg.bool("utc").unwrap());
    assert_eq!(cfg.str("position").unwrap(), "top-left");
    assert!(cfg.get("unknown").is_none());
}

#[test]
fn null_override_falls_back_to_default() {
    let cfg = resolve_config(&fields(), &overrides(json!({ "rows": null }))).unwrap();
    assert_eq!(cfg.i64("rows").unwrap(), 1);
}

#[test]
fn bad_values_are_config_faults() {
    for bad in [
        json!({ "rows": "three" }),
        json!({ "color": "#zzzzzz" }),
        json!({ "position": "bottom" }),
        json!({ "utc": "maybe" }),
    ] {
        let err = resolve_config(&fields(), &overrides(bad)).unwrap_err();
        assert!(matches!(err, InkframeError::Config(_)), "{err}");
    }
}

#[test]
fn required_field_without_value_is_a_config_fault() {
    let f = vec![FieldSpec::new("url", FieldKind::String).required()];
    let err = resolve_config(&f, &JsonMap::new()).unwrap_err();
    assert!(err.to_string().contains("'url' is required"));

    let cfg = resolve_config(&f, &overrides(json!({ "url": "http://x" }))).unwrap();
    assert_eq!(cfg.str("url").unwrap(), "http://x");
}
