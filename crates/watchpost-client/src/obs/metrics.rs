//! In-process metrics registry for the console client.
//!
//! Counter/gauge/histogram types with dynamic labels backed by `DashMap`, so
//! the transport task and the console task can both record without locks.
//! Labels are flattened into sorted key vectors to keep rendering
//! deterministic. Histogram buckets are fixed in microseconds.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn render_labels(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Number of distinct label sets recorded.
    pub fn series(&self) -> usize {
        self.map.len()
    }

    /// Current value for an exact label set (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", name, render_labels(r.key()), val);
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    pub fn set(&self, labels: &[(&str, &str)], v: i64) {
        let gauge = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicI64::new(0));
        gauge.store(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> i64 {
        self.map
            .get(&label_key(labels))
            .map(|g| g.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} gauge", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", name, render_labels(r.key()), val);
        }
    }
}

// 50us, 100us, 500us, 1ms, 5ms, 10ms, 50ms, 100ms
const BUCKETS_MICROS: [u64; 8] = [50, 100, 500, 1_000, 5_000, 10_000, 50_000, 100_000];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 8],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration (cumulative buckets, microsecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let micros = duration.as_micros() as u64;

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);
        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for r in self.map.iter() {
            let hist = r.value();
            let label_str = render_labels(r.key());
            let prefix = if label_str.is_empty() {
                String::new()
            } else {
                format!("{},", label_str)
            };

            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);
            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_sum{{{}}} {}", name, label_str, sum);
            let _ = writeln!(out, "{}_count{{{}}} {}", name, label_str, count);
        }
    }
}

/// Inbound commands that get their own `cmd` series.
const LABELLED_CMDS: [&str; 16] = [
    "HELLO_OK",
    "HELLO_FAIL",
    "LOGIN_OK",
    "LOGIN_FAIL",
    "ESTOP_STATE",
    "FIRE_EVENT",
    "GO_TO_FAIL",
    "UPLOAD_READY",
    "UPLOAD_DONE",
    "FACTORY_DATA",
    "FACTORY_UPDATE",
    "FACTORY_DATA_PUSH",
    "ROBOT_EVENT",
    "ROBOT_ERROR",
    "PING",
    "PONG",
];

/// Bounded label value for a server-supplied command name. The `USER_*` and
/// `ADMIN_*` families collapse to their prefix; anything else unknown is
/// `OTHER`.
pub fn cmd_label(cmd: &str) -> &'static str {
    if let Some(known) = LABELLED_CMDS.iter().copied().find(|c| *c == cmd) {
        return known;
    }
    if cmd.starts_with("USER_") {
        "USER_*"
    } else if cmd.starts_with("ADMIN_") {
        "ADMIN_*"
    } else {
        "OTHER"
    }
}

/// Every metric the client records. Shared as `Arc<ConsoleMetrics>` between
/// the transport task and the console task.
#[derive(Default)]
pub struct ConsoleMetrics {
    /// Decoded inbound messages, by [`cmd_label`].
    pub messages_received: CounterVec,
    /// Inbound lines dropped as malformed.
    pub bad_lines: CounterVec,
    /// Outbound lines held while disconnected.
    pub offline_queued: CounterVec,
    /// Outbound lines written, by `path` (direct / flush / hello).
    pub lines_sent: CounterVec,
    /// Connection state transitions, by `state`.
    pub connection_states: CounterVec,
    /// Transport errors surfaced to the console.
    pub transport_errors: CounterVec,
    /// Router decisions, by `verdict`.
    pub routed: CounterVec,
    /// Side effects skipped by dedup or cooldown, by `rule`.
    pub dedup_suppressed: CounterVec,
    /// Messages waiting in the dispatch queue after the last drain.
    pub dispatch_queue_depth: GaugeVec,
    pub drain_duration: HistogramVec,
}

impl ConsoleMetrics {
    /// Render in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.messages_received.render("watchpost_messages_received_total", &mut out);
        self.bad_lines.render("watchpost_bad_lines_total", &mut out);
        self.offline_queued.render("watchpost_offline_queued_total", &mut out);
        self.lines_sent.render("watchpost_lines_sent_total", &mut out);
        self.connection_states.render("watchpost_connection_states_total", &mut out);
        self.transport_errors.render("watchpost_transport_errors_total", &mut out);
        self.routed.render("watchpost_routed_total", &mut out);
        self.dedup_suppressed.render("watchpost_dedup_suppressed_total", &mut out);
        self.dispatch_queue_depth.render("watchpost_dispatch_queue_depth", &mut out);
        self.drain_duration.render("watchpost_drain_duration_micros", &mut out);
        out
    }
}
