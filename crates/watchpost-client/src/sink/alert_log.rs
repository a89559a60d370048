//! Bounded in-memory alert table; the default `ConsoleSurface`.
//!
//! Rows are kept newest first and capped at [`MAX_ROWS`]. Management
//! traffic (user admin, handshakes, keepalives) and equipment pushes are
//! not incident material and never become rows.

use std::collections::VecDeque;

use watchpost_core::Message;

use crate::clock::{system_clock, Clock};
use crate::surface::ConsoleSurface;
use crate::transport::ConnectionState;

pub const MAX_ROWS: usize = 1000;

const MGMT_CMDS: [&str; 6] = ["HELLO", "HELLO_OK", "HELLO_FAIL", "PING", "PONG", "UPLOAD_READY"];
const FACTORY_CMDS: [&str; 3] = ["FACTORY_DATA", "FACTORY_UPDATE", "FACTORY_DATA_PUSH"];
const LOCATION_KEYS: [&str; 3] = ["saved_path", "path", "file"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRow {
    pub ts: String,
    pub kind: String,
    pub level: String,
    pub state: String,
    pub location: String,
    pub description: String,
}

pub fn is_management(cmd: &str) -> bool {
    cmd.starts_with("USER_") || cmd.starts_with("ADMIN_") || MGMT_CMDS.contains(&cmd)
}

#[derive(Debug)]
pub struct AlertLog {
    rows: VecDeque<AlertRow>,
    /// Stamps rows that carry no server `ts`.
    clock: Clock,
    emergency_stop: Option<bool>,
    factory: Option<(i32, i32)>,
    connection: ConnectionState,
    last_error: Option<String>,
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::with_clock(system_clock)
    }
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            rows: VecDeque::new(),
            clock,
            emergency_stop: None,
            factory: None,
            connection: ConnectionState::default(),
            last_error: None,
        }
    }

    /// Newest first.
    pub fn rows(&self) -> impl Iterator<Item = &AlertRow> {
        self.rows.iter()
    }

    pub fn latest(&self) -> Option<&AlertRow> {
        self.rows.front()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn emergency_stop(&self) -> Option<bool> {
        self.emergency_stop
    }

    /// Last `(run, door)` reflected by the router.
    pub fn factory_state(&self) -> Option<(i32, i32)> {
        self.factory
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn push(&mut self, row: AlertRow) {
        self.rows.push_front(row);
        self.rows.truncate(MAX_ROWS);
    }

    fn receive_ts(&self) -> String {
        (self.clock)().to_string()
    }

    fn row_for(&self, msg: &Message, cmd: String) -> AlertRow {
        let ts = match msg.str_field("ts") {
            Some(ts) if !ts.is_empty() => ts.to_string(),
            _ => self.receive_ts(),
        };

        let ok = msg.bool_field("ok").unwrap_or(false);
        let level = match msg.str_field("level").filter(|l| !l.is_empty()) {
            Some(l) => l.to_uppercase(),
            None if cmd == "ROBOT_ERROR" => "ERROR".to_string(),
            None if cmd == "UPLOAD_DONE" && !ok => "ERROR".to_string(),
            None => "INFO".to_string(),
        };
        let state = match (cmd.as_str(), ok) {
            ("UPLOAD_DONE", true) => "OK",
            ("UPLOAD_DONE", false) => "FAIL",
            _ => "-",
        };
        let location = LOCATION_KEYS
            .iter()
            .filter_map(|k| msg.str_field(k))
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string();
        let description = match msg.str_field("msg") {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => msg.to_compact(),
        };

        AlertRow {
            ts,
            kind: cmd,
            level,
            state: state.to_string(),
            location,
            description,
        }
    }
}

impl ConsoleSurface for AlertLog {
    fn append_json(&mut self, msg: &Message) {
        let cmd = msg.command();
        if is_management(&cmd) || FACTORY_CMDS.contains(&cmd.as_str()) {
            return;
        }
        let row = self.row_for(msg, cmd);
        tracing::debug!(kind = %row.kind, level = %row.level, "alert row");
        self.push(row);
    }

    fn set_emergency_stop(&mut self, engaged: bool) {
        if self.emergency_stop != Some(engaged) {
            tracing::info!(engaged, "emergency stop");
        }
        self.emergency_stop = Some(engaged);
    }

    fn set_factory_state(&mut self, run: i32, door: i32) {
        tracing::info!(run, door, "factory state");
        self.factory = Some((run, door));
    }

    fn notify(&mut self, title: &str, message: &str) {
        tracing::info!(title, message, "notification");
        let location = if title.is_empty() { "-" } else { title };
        let row = AlertRow {
            ts: self.receive_ts(),
            kind: "NOTICE".to_string(),
            level: "INFO".to_string(),
            state: "-".to_string(),
            location: location.to_string(),
            description: message.to_string(),
        };
        self.push(row);
    }

    fn set_connection_state(&mut self, state: ConnectionState) {
        self.connection = state;
        if state == ConnectionState::Connected {
            self.last_error = None;
        }
    }

    fn set_network_error(&mut self, error: &str) {
        self.last_error = Some(error.to_string());
    }
}
