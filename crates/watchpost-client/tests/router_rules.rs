#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use serde_json::json;

use watchpost_client::obs::ConsoleMetrics;
use watchpost_client::router::{CommandRouter, DedupCache, RouterConfig, Verdict};
use watchpost_client::surface::ConsoleSurface;
use watchpost_core::Message;

#[derive(Default)]
struct Recorder {
    forwarded: Vec<Message>,
    notes: Vec<(String, String)>,
    factory: Vec<(i32, i32)>,
    estop: Vec<bool>,
}

impl ConsoleSurface for Recorder {
    fn append_json(&mut self, msg: &Message) {
        self.forwarded.push(msg.clone());
    }
    fn set_emergency_stop(&mut self, engaged: bool) {
        self.estop.push(engaged);
    }
    fn set_factory_state(&mut self, run: i32, door: i32) {
        self.factory.push((run, door));
    }
    fn notify(&mut self, title: &str, message: &str) {
        self.notes.push((title.to_string(), message.to_string()));
    }
}

fn msg(v: serde_json::Value) -> Message {
    serde_json::from_value(v).unwrap()
}

#[test]
fn dedup_window_boundaries() {
    let mut d = DedupCache::new(3000, 0);
    assert!(d.check("K", 0));
    assert!(!d.check("K", 2999));
    assert_eq!(d.last_seen("K"), Some(0));
    assert!(d.check("K", 3000));
    assert_eq!(d.last_seen("K"), Some(3000));
    assert!(d.check("other", 3001));
}

#[test]
fn dedup_sweep_only_forgets_expired_keys() {
    let mut d = DedupCache::new(3000, 64);
    for i in 0..64 {
        assert!(d.check(&format!("old{i}"), 0));
    }
    // crossing the bound sweeps, but nothing has expired yet
    assert!(d.check("fresh", 1000));
    assert_eq!(d.len(), 65);

    // same window: no second sweep while every entry is still fresh
    assert!(d.check("newer", 2000));
    assert_eq!(d.len(), 66);

    // next window: entries at or past their window are dropped
    assert!(d.check("trigger", 4000));
    assert_eq!(d.len(), 2);
    assert!(d.last_seen("newer").is_some());
    assert!(!d.check("newer", 4999));
}

#[test]
fn dedup_flood_sweeps_once_per_window() {
    let mut d = DedupCache::new(3000, 64);
    for i in 0..500 {
        assert!(d.check(&format!("k{i}"), 10));
    }
    // the one sweep at the bound found nothing expired; the rest were skipped
    assert_eq!(d.len(), 500);
    assert!(d.check("late", 3010));
    assert_eq!(d.len(), 1);
}

#[test]
fn fire_confirmed_is_never_forwarded() {
    let mut r = CommandRouter::default();
    let mut s = Recorder::default();
    let m = msg(json!({"cmd":"FIRE_EVENT","payload":{"event":"fire_confirmed","incident_id":"F1"}}));

    for t in [0, 100, 2999, 3000, 25_000] {
        let d = r.route(&m, t, &mut s);
        assert_eq!(d.verdict, Verdict::Absorb);
        assert_eq!(d.rule, "fire_event");
    }
    assert!(s.forwarded.is_empty());
    // hook at t=0, cooldown blocks until t=20000, dedup passes at 25000
    assert_eq!(s.notes.len(), 2);
    assert_eq!(s.notes[0].0, "Fire confirmed");
    assert_eq!(r.last_fire_confirmed_ms(), Some(25_000));
}

#[test]
fn fire_cooldown_is_global_across_incidents() {
    let mut r = CommandRouter::default();
    let mut s = Recorder::default();
    let a = msg(json!({"cmd":"FIRE_EVENT","event":"fire_confirmed","id":"A"}));
    let b = msg(json!({"cmd":"FIRE_EVENT","event":"fire_confirmed","id":"B"}));

    r.route(&a, 1000, &mut s);
    r.route(&b, 5000, &mut s);
    assert_eq!(s.notes.len(), 1);
    r.route(&b, 21_000, &mut s);
    assert_eq!(s.notes.len(), 2);
    assert_eq!(s.notes[1].1, "B");
}

#[test]
fn other_fire_events_are_absorbed() {
    let mut r = CommandRouter::default();
    let mut s = Recorder::default();
    for ev in ["session_ended", "session_ended", "session_started", "smoke"] {
        let m = msg(json!({"cmd":"fire_event","id":7,"payload":{"event":ev}}));
        assert_eq!(r.route(&m, 10, &mut s).verdict, Verdict::Absorb);
    }
    assert!(s.forwarded.is_empty());
    assert_eq!(s.notes, vec![("Fire session ended".to_string(), "7".to_string())]);
}

#[test]
fn factory_push_reflects_only_changes() {
    let mut r = CommandRouter::default();
    let mut s = Recorder::default();
    let m = msg(json!({"cmd":"FACTORY_DATA","run":1}));

    assert_eq!(r.route(&m, 0, &mut s).verdict, Verdict::Absorb);
    assert_eq!(r.route(&m, 1, &mut s).verdict, Verdict::Absorb);
    assert_eq!(s.factory, vec![(1, -1)]);
    assert!(s.forwarded.is_empty());

    // helmet/error changes update the cache without a UI call
    let m = msg(json!({"cmd":"FACTORY_UPDATE","run":true,"helmet_ok":0,"fault":1}));
    r.route(&m, 2, &mut s);
    assert_eq!(s.factory.len(), 1);
    let eq = r.equipment();
    assert_eq!((eq.run, eq.door, eq.helmet_ok, eq.error), (1, -1, 0, 1));

    let m = msg(json!({"cmd":"FACTORY_DATA_PUSH","door":1.0,"error":-1,"fault":0}));
    r.route(&m, 3, &mut s);
    assert_eq!(s.factory, vec![(1, -1), (1, 1)]);
    assert_eq!(r.equipment().error, 0);
}

#[test]
fn upload_ok_forwards_twice_hooks_once() {
    let mut r = CommandRouter::default();
    let mut s = Recorder::default();
    let m = msg(json!({"cmd":"UPLOAD_DONE","ok":true,"id":"A1","saved_path":"/x/y.mp4"}));

    assert_eq!(r.route(&m, 0, &mut s).verdict, Verdict::Forward);
    assert_eq!(r.route(&m, 1500, &mut s).verdict, Verdict::Forward);
    assert_eq!(s.forwarded, vec![m.clone(), m]);
    assert_eq!(
        s.notes,
        vec![("Evidence uploaded".to_string(), "A1: /x/y.mp4".to_string())]
    );
}

#[test]
fn upload_failure_and_success_dedup_independently() {
    let mut r = CommandRouter::default();
    let mut s = Recorder::default();
    let fail = msg(json!({"cmd":"UPLOAD_DONE","ok":false,"id":"A1","path":"/x","reason":"disk full"}));
    let ok = msg(json!({"cmd":"UPLOAD_DONE","ok":true,"id":"A1","path":"/x"}));

    r.route(&fail, 0, &mut s);
    r.route(&fail, 10, &mut s);
    r.route(&ok, 20, &mut s);
    assert_eq!(s.forwarded.len(), 3);
    assert_eq!(s.notes.len(), 2);
    assert_eq!(s.notes[0].0, "Evidence upload failed");
    assert!(r.dedup().last_seen("UPLOAD_DONE|FAIL|A1|/x|disk full").is_some());
    assert!(r.dedup().last_seen("UPLOAD_DONE|OK|A1|/x").is_some());
}

#[test]
fn go_to_fail_tracks_reasons_separately() {
    let mut r = CommandRouter::default();
    let mut s = Recorder::default();
    let blocked = msg(json!({"cmd":"GO_TO_FAIL","task_id":9,"reason":"blocked"}));
    let lost = msg(json!({"cmd":"GO_TO_FAIL","task_id":9,"reason":"lost"}));

    for m in [&blocked, &blocked, &lost] {
        let d = r.route(m, 0, &mut s);
        assert_eq!(d.verdict, Verdict::Forward);
        assert_eq!(d.rule, "default");
    }
    assert_eq!(s.forwarded.len(), 3);
    assert_eq!(s.notes.len(), 2);
    assert_eq!(s.notes[1].1, "9: lost");
}

#[test]
fn estop_state_reflects_then_forwards() {
    let mut r = CommandRouter::default();
    let mut s = Recorder::default();
    let on = msg(json!({"cmd":"ESTOP_STATE","engaged":true}));
    let bare = msg(json!({"cmd":"ESTOP_STATE"}));

    assert_eq!(r.route(&on, 0, &mut s).verdict, Verdict::Forward);
    assert_eq!(r.route(&bare, 1, &mut s).verdict, Verdict::Forward);
    assert_eq!(s.estop, vec![true, false]);
    assert_eq!(r.emergency_stop(), Some(false));
    assert_eq!(s.forwarded.len(), 2);
}

#[test]
fn unknown_and_missing_commands_fail_open() {
    let mut r = CommandRouter::default();
    let mut s = Recorder::default();
    for m in [
        msg(json!({"cmd":"ROBOT_ERROR","msg":"arm jammed"})),
        msg(json!({"cmd":"SOMETHING_NEW"})),
        msg(json!({"no_cmd":1})),
    ] {
        assert_eq!(r.route(&m, 0, &mut s).verdict, Verdict::Forward);
    }
    assert_eq!(s.forwarded.len(), 3);
}

#[test]
fn metrics_count_verdicts_and_suppressions() {
    let metrics = Arc::new(ConsoleMetrics::default());
    let mut r = CommandRouter::new(RouterConfig::default()).with_metrics(Arc::clone(&metrics));
    let mut s = Recorder::default();
    let m = msg(json!({"cmd":"GO_TO_FAIL","id":"x","reason":"y"}));
    r.route(&m, 0, &mut s);
    r.route(&m, 1, &mut s);
    r.route(&msg(json!({"cmd":"FACTORY_DATA","run":0})), 2, &mut s);

    assert_eq!(metrics.routed.get(&[("verdict", "forward"), ("rule", "default")]), 2);
    assert_eq!(metrics.routed.get(&[("rule", "factory_push"), ("verdict", "absorb")]), 1);
    assert_eq!(metrics.dedup_suppressed.get(&[("rule", "go_to_fail")]), 1);

    let text = metrics.render();
    assert!(text.contains("watchpost_routed_total{rule=\"default\",verdict=\"forward\"} 2"));
}
