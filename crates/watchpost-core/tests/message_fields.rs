#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::json;

use watchpost_core::protocol::requests;
use watchpost_core::Message;

fn msg(v: serde_json::Value) -> Message {
    serde_json::from_value(v).unwrap()
}

#[test]
fn pick_str_takes_first_present_key_in_order() {
    let m = msg(json!({"cmd": "GO_TO_FAIL", "id": "r-1", "task_id": "t-9"}));
    assert_eq!(m.pick_str(&["incident_id", "id", "task_id"]), "r-1");
    assert_eq!(m.pick_str(&["task_id", "id"]), "t-9");
    assert_eq!(m.pick_str(&["nope"]), "");
}

#[test]
fn pick_str_coerces_scalars() {
    let m = msg(json!({"n": 42, "f": 2.5, "whole": 7.0, "b": false, "neg": -3}));
    assert_eq!(m.pick_str(&["n"]), "42");
    assert_eq!(m.pick_str(&["f"]), "2.5");
    assert_eq!(m.pick_str(&["whole"]), "7");
    assert_eq!(m.pick_str(&["b"]), "false");
    assert_eq!(m.pick_str(&["neg"]), "-3");
}

#[test]
fn pick_str_searches_nested_objects() {
    let m = msg(json!({
        "cmd": "FIRE_EVENT",
        "payload": {"event": "fire_confirmed", "zone": "B2"}
    }));
    assert_eq!(m.pick_str(&["event", "payload"]), "fire_confirmed");

    let m = msg(json!({"error": {"code": 5, "message": "disk full"}}));
    assert_eq!(m.pick_str(&["reason", "error", "message"]), "disk full");

    // nested object without representative keys falls through to the next candidate
    let m = msg(json!({"payload": {"filename": "a.mp4"}, "event": "x"}));
    assert_eq!(m.pick_str(&["payload", "event"]), "x");
}

#[test]
fn pick_str_returns_empty_string_values_verbatim() {
    let m = msg(json!({"id": "", "task_id": "t-1"}));
    assert_eq!(m.pick_str(&["id", "task_id"]), "");
}

#[test]
fn pick_str_skips_null_and_arrays() {
    let m = msg(json!({"id": null, "incident_id": [1, 2], "request_id": "q"}));
    assert_eq!(m.pick_str(&["incident_id", "id", "request_id"]), "q");
}

#[test]
fn command_is_upper_cased() {
    let m = msg(json!({"cmd": "estop_state"}));
    assert_eq!(m.cmd(), "estop_state");
    assert_eq!(m.command(), "ESTOP_STATE");
    assert_eq!(Message::default().command(), "");
}

#[test]
fn request_builders_shape() {
    assert_eq!(
        requests::hello("kiosk").to_compact(),
        r#"{"cmd":"HELLO","role":"kiosk"}"#
    );
    assert_eq!(
        requests::login("root", "pw").to_compact(),
        r#"{"admin_id":"root","cmd":"LOGIN","pw":"pw"}"#
    );
    assert_eq!(requests::estop_set(true).bool_field("engaged"), Some(true));
    assert_eq!(requests::user_delete("u7").str_field("id"), Some("u7"));
    assert_eq!(
        requests::user_add(json!({"id": "u8", "name": "Kim"}))
            .get("user")
            .and_then(|u| u.get("name"))
            .and_then(|n| n.as_str()),
        Some("Kim")
    );
    assert_eq!(requests::user_list().cmd(), "USER_LIST");
    assert_eq!(requests::DEFAULT_ROLE, "admin");
}
