//! Outbound request builders.
//!
//! Each helper returns a ready-to-send [`Message`]; the transport handles
//! framing and offline queueing.

use serde_json::Value;

use crate::protocol::message::Message;

/// Role identifier sent in the handshake when none is configured.
pub const DEFAULT_ROLE: &str = "admin";

/// Handshake sent first on every new connection.
pub fn hello(role: &str) -> Message {
    Message::new("HELLO").with("role", role)
}

pub fn login(admin_id: &str, pw: &str) -> Message {
    Message::new("LOGIN")
        .with("admin_id", admin_id)
        .with("pw", pw)
}

/// Engage or release the emergency stop. The server answers with
/// `ESTOP_STATE`, which is what the console reflects.
pub fn estop_set(engaged: bool) -> Message {
    Message::new("ESTOP_SET").with("engaged", engaged)
}

pub fn user_list() -> Message {
    Message::new("USER_LIST")
}

/// `user` is the user record object as the server expects it.
pub fn user_add(user: Value) -> Message {
    Message::new("USER_ADD").with("user", user)
}

pub fn user_update(user: Value) -> Message {
    Message::new("USER_UPDATE").with("user", user)
}

pub fn user_delete(id: &str) -> Message {
    Message::new("USER_DELETE").with("id", id)
}
