//! watchpost core: wire-level primitives for the console protocol.
//!
//! This crate defines the line-delimited JSON framing, the untyped
//! `Message` record with its field-extraction helpers, the outbound request
//! builders, and the error surface shared by the client crate. It carries
//! no socket or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed input
//! from the server surfaces as `WatchpostError` or as a dropped line, never
//! as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, WatchpostError};
pub use protocol::message::Message;
