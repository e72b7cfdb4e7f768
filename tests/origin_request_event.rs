//! Origin-request events processed end to end, as `invoke` does.

use serde_json::Value;

use content_hash_edge::config::parse_config;
use content_hash_edge::edge::{handle_event, EdgeEvent, CONTENT_SHA256_HEADER};

const EVENT: &str = include_str!("../demos/origin-request.json");

#[test]
fn test_sample_event_gets_hash_and_keeps_origin() {
    let raw: Value = serde_json::from_str(EVENT).unwrap();
    let event: EdgeEvent = serde_json::from_str(EVENT).unwrap();

    let request = handle_event(event).unwrap();
    let out = serde_json::to_value(&request).unwrap();

    assert_eq!(
        out["headers"][CONTENT_SHA256_HEADER],
        serde_json::json!([{
            "key": CONTENT_SHA256_HEADER,
            "value": "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        }])
    );

    let original = &raw["Records"][0]["cf"]["request"];
    assert_eq!(out["origin"], original["origin"]);
    assert_eq!(out["body"], original["body"]);
    assert_eq!(out["headers"]["host"], original["headers"]["host"]);
    assert_eq!(out["headers"].as_object().unwrap().len(), 3);
}

#[test]
fn test_second_pass_changes_nothing() {
    let event: EdgeEvent = serde_json::from_str(EVENT).unwrap();
    let once = handle_event(event).unwrap();

    let twice = handle_event(EdgeEvent::from_request(once.clone())).unwrap();

    assert_eq!(once, twice);
}

#[test]
fn test_sample_config_is_valid() {
    let config = parse_config(include_str!("../demos/edge.toml")).unwrap();
    assert!(config.observability.metrics_enabled);
    assert_eq!(config.upstream.address, "127.0.0.1:9000");
}
