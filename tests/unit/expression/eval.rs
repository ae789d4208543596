use super::*;
use serde_json::json;

fn state(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        other => panic!("state fixture must be an object, got {other}"),
    }
}

fn check(src: &str, st: &Map<String, Value>) -> bool {
    Condition::parse(src).unwrap().evaluate(st).unwrap()
}

#[test]
fn compares_numbers_from_state() {
    let st = state(json!({ "x": -1, "y": 2.5 }));
    assert!(!check("x > 0", &st));
    assert!(check("x <= 0 && y == 2.5", &st));
    assert!(check("x * 2 + 3 == 1", &st));
    assert!(check("abs(x) == 1", &st));
}

#[test]
fn nested_paths_and_missing_keys() {
    let st = state(json!({ "weather": { "days": [ { "rain": true } ] } }));
    assert!(check("weather.days.0.rain", &st));
    assert!(!check("weather.snow", &st));
    assert!(check("weather.snow == null", &st));
    assert!(check("len(weather.days) == 1", &st));
}

#[test]
fn strings_and_short_circuit() {
    let st = state(json!({ "mode": "night" }));
    assert!(check("mode == 'night' || missing > 1", &st));
    assert!(check("mode != \"day\"", &st));
    assert!(!check("false && missing > 1", &st));
    assert!(check("!''", &st));
}

#[test]
fn ordering_null_against_number_is_an_error() {
    let cond = Condition::parse("missing > 0").unwrap();
    let err = cond.evaluate(&Map::new()).unwrap_err();
    assert!(err.message.contains("cannot compare null with number"));
}

#[test]
fn division_by_zero_is_an_error() {
    let cond = Condition::parse("1 / 0").unwrap();
    assert!(cond.evaluate(&Map::new()).is_err());
}

#[test]
fn rejects_unterminated_strings() {
    assert!(Condition::parse("mode == 'night").is_err());
}

#[test]
fn errors_name_their_condition_and_map_into_the_app_taxonomy() {
    let err = Condition::parse("mode == 'night").unwrap_err();
    assert_eq!(err.condition.as_deref(), Some("mode == 'night"));
    let config: crate::foundation::error::InkframeError = err.into();
    assert!(
        matches!(&config, crate::foundation::error::InkframeError::Config(msg)
            if msg.starts_with("invalid condition 'mode == 'night' at byte 8")),
        "{config}"
    );

    let err = Condition::parse("1 / 0").unwrap().evaluate(&Map::new()).unwrap_err();
    let signal: crate::eval::context::Signal = err.into();
    assert!(
        matches!(&signal, crate::eval::context::Signal::Fault(e) if !e.is_structural()),
        "{signal:?}"
    );
}
