//! Protocol modules for the console wire format.
//!
//! - `line`: one compact JSON object per `\n`-terminated UTF-8 line.
//! - `message`: the untyped key-value record and its extraction helpers.
//! - `requests`: builders for the outbound commands the console sends.
//!
//! Decoding is panic-free: a malformed line is dropped with a warning and
//! the rest of the buffer keeps decoding.

pub mod line;
pub mod message;
pub mod requests;
