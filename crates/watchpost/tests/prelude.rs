#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use watchpost::prelude::*;

#[test]
fn prelude_builds_a_console() {
    let cfg = load_from_str("version: 1\ndispatch: { budget: 5 }\n").unwrap();
    let metrics = Arc::new(ConsoleMetrics::default());
    let mut console = Console::new(&cfg, AlertLog::new(), metrics);

    console.enqueue(requests::estop_set(true));
    console.drain();
    assert_eq!(console.surface().len(), 1);
    assert_eq!(console.surface().latest().unwrap().kind, "ESTOP_SET");
}

#[test]
fn modules_are_reexported() {
    let err = watchpost::core::WatchpostError::Disconnected;
    assert_eq!(err.code().as_str(), "DISCONNECTED");
    assert_eq!(
        watchpost::client::dispatch::DEFAULT_BUDGET,
        200
    );
}
