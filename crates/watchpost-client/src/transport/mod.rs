//! Transport layer (line-delimited JSON over TCP).
//!
//! `client` owns the socket on its own task and talks to the console through
//! channels; `outbound` holds the offline queue and handshake ordering;
//! `state` defines the connection states and events it reports.

pub mod client;
pub mod outbound;
pub mod state;

pub use client::{ClientOptions, NetworkClient};
pub use outbound::{OutboundQueue, SendAction};
pub use state::{ClientEvent, ConnectionState};
