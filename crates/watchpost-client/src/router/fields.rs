//! Typed view of the fields the router inspects.
//!
//! Servers spell the same concept several ways; each field is taken from
//! the first key present in its candidate list.

use watchpost_core::Message;

pub const ID_KEYS: [&str; 4] = ["incident_id", "id", "task_id", "request_id"];
pub const EVENT_KEYS: [&str; 2] = ["event", "payload"];
pub const REASON_KEYS: [&str; 3] = ["reason", "error", "message"];
pub const PATH_KEYS: [&str; 3] = ["saved_path", "path", "url"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFields {
    /// Upper-cased `cmd`.
    pub cmd: String,
    pub id: String,
    /// Sub-event name; covers `payload.event`.
    pub event: String,
    pub reason: String,
    pub saved_path: String,
    /// `ok` flag; false unless a JSON `true`.
    pub ok: bool,
}

impl MessageFields {
    pub fn extract(msg: &Message) -> Self {
        Self {
            cmd: msg.command(),
            id: msg.pick_str(&ID_KEYS),
            event: msg.pick_str(&EVENT_KEYS),
            reason: msg.pick_str(&REASON_KEYS),
            saved_path: msg.pick_str(&PATH_KEYS),
            ok: msg.bool_field("ok").unwrap_or(false),
        }
    }

    pub fn event_is(&self, name: &str) -> bool {
        self.event.eq_ignore_ascii_case(name)
    }
}
