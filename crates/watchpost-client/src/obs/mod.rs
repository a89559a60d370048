//! Lightweight in-process metrics.
//!
//! Counters and gauges are atomics behind `DashMap`s and can be rendered in
//! Prometheus text format; the binary logs a render at shutdown.

pub mod metrics;

pub use metrics::{cmd_label, ConsoleMetrics};
