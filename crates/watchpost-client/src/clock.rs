//! Wall clock shared by the console runtime and the alert log.

use std::time::{SystemTime, UNIX_EPOCH};

/// Epoch milliseconds. A plain fn pointer so tests can pin time.
pub type Clock = fn() -> i64;

pub fn system_clock() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
