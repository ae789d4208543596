use super::*;
use crate::scene::device::DeviceConfig;

fn device(json: &str) -> DeviceConfig {
    serde_json::from_str(json).expect("parse device fixture")
}

#[test]
fn accepts_minimal_device() {
    let def = device(
        r#"{
          "width": 8, "height": 4,
          "scene": {
            "id": "s",
            "nodes": [
              { "id": "e", "type": "event", "data": { "keyword": "render" } },
              { "id": "a", "type": "app", "data": { "keyword": "color" } }
            ],
            "edges": [ { "id": "e1", "source": "e", "target": "a" } ]
          }
        }"#,
    );
    validate_device(&def).unwrap();
}

#[test]
fn reports_every_problem_with_paths() {
    let def = device(
        r#"{
          "width": 0, "height": 4, "interval": 0,
          "scene": {
            "id": "s",
            "nodes": [
              { "id": "a", "type": "app", "data": { "keyword": "" } },
              { "id": "a", "type": "app", "data": { "keyword": "color" } }
            ],
            "edges": [ { "id": "e1", "source": "a", "target": "missing" } ]
          }
        }"#,
    );
    let err = validate_device(&def).unwrap_err();
    let msg = err.to_string();
    assert_eq!(err.errors.len(), 5, "{msg}");
    assert!(msg.contains("$.width: width must be > 0"));
    assert!(msg.contains("$.interval:"));
    assert!(msg.contains("$.scene.nodes[0].data.keyword"));
    assert!(msg.contains("$.scene.nodes[1].id: duplicate node id \"a\""));
    assert!(msg.contains("$.scene.edges[0].target"));
}

#[test]
fn unknown_node_kinds_load_without_errors() {
    let scene = crate::scene::model::Scene::from_json_str(
        r#"{ "id": "s", "nodes": [ { "id": "c", "type": "code", "data": {} } ] }"#,
    )
    .unwrap();
    validate_scene(&scene).unwrap();
}

#[test]
fn rejects_intervals_a_duration_cannot_hold() {
    for interval in ["1e30", "-5", "0"] {
        let def = device(&format!(
            r#"{{ "width": 4, "height": 4, "interval": {interval},
                 "scene": {{ "id": "s", "nodes": [], "edges": [] }} }}"#
        ));
        let err = validate_device(&def).unwrap_err();
        assert_eq!(err.errors.len(), 1, "{interval}: {err}");
        assert!(err.to_string().contains("$.interval:"), "{err}");
    }
    assert!(interval_from_secs(1e30).is_err());
    assert!(interval_from_secs(f64::NAN).is_err());
    assert_eq!(interval_from_secs(2.5).unwrap(), std::time::Duration::from_millis(2500));
}
