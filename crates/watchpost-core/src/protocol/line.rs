//! Line framing: one compact JSON object followed by a single `\n`.
//!
//! Decoding rules:
//! - Lines are split on `\n` and trimmed of surrounding whitespace.
//! - Empty lines are skipped.
//! - A line that is not a JSON object is dropped with a warning; the
//!   following lines still decode.
//! - Bytes after the last `\n` stay buffered until the next read.
//! - With a size limit, an over-long partial line is dropped as a whole:
//!   the buffer is cleared and input is skipped through its `\n`.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde_json::Value;

use crate::error::{Result, WatchpostError};
use crate::protocol::message::Message;

/// Encode a message as one wire line (compact JSON + `\n`).
pub fn encode(msg: &Message) -> Bytes {
    let text = msg.to_compact();
    let mut out = BytesMut::with_capacity(text.len() + 1);
    out.put_slice(text.as_bytes());
    out.put_u8(b'\n');
    out.freeze()
}

/// Parse a single line (without its `\n`).
///
/// Returns `Ok(None)` for a blank line.
pub fn decode_line(line: &[u8]) -> Result<Option<Message>> {
    let line = trim(line);
    if line.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_slice(line)
        .map_err(|e| WatchpostError::BadFrame(format!("invalid json: {e}")))?;
    match value {
        Value::Object(map) => Ok(Some(Message::from_map(map))),
        _ => Err(WatchpostError::BadFrame("line is not a json object".into())),
    }
}

/// Drain every complete line from `buf`, returning the decoded messages in
/// arrival order. A trailing partial line is left in `buf`.
pub fn decode(buf: &mut BytesMut) -> Vec<Message> {
    decode_counting(buf).0
}

/// Like [`decode`], also returning how many lines were dropped as malformed.
pub fn decode_counting(buf: &mut BytesMut) -> (Vec<Message>, usize) {
    let mut out = Vec::new();
    let mut dropped = 0;
    while let Some(idx) = buf.iter().position(|b| *b == b'\n') {
        let line = buf.split_to(idx);
        buf.advance(1);
        match decode_line(&line) {
            Ok(Some(msg)) => out.push(msg),
            Ok(None) => {}
            Err(e) => {
                dropped += 1;
                tracing::warn!(
                    code = e.code().as_str(),
                    line = %String::from_utf8_lossy(&line),
                    "dropping malformed line"
                );
            }
        }
    }
    (out, dropped)
}

/// Stateful receive-side decoder that owns the accumulation buffer.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: BytesMut,
    /// 0 = unbounded.
    max_line_bytes: usize,
    dropped: u64,
    /// Set after an over-limit partial line was discarded; the rest of that
    /// line is skipped up to and including its `\n`.
    discarding: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder that discards a partial line once it grows past `max` bytes.
    pub fn with_max_line_bytes(max: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_line_bytes: max,
            dropped: 0,
            discarding: false,
        }
    }

    /// Append received bytes and return every message completed by them.
    pub fn feed(&mut self, mut data: &[u8]) -> Vec<Message> {
        if self.discarding {
            let Some(idx) = data.iter().position(|b| *b == b'\n') else {
                return Vec::new();
            };
            data = &data[idx + 1..];
            self.discarding = false;
        }
        self.buf.extend_from_slice(data);
        let (out, dropped) = decode_counting(&mut self.buf);
        self.dropped += dropped as u64;
        if self.max_line_bytes > 0 && self.buf.len() > self.max_line_bytes {
            tracing::warn!(
                buffered = self.buf.len(),
                max = self.max_line_bytes,
                "partial line exceeds limit; discarding"
            );
            self.buf.clear();
            self.dropped += 1;
            self.discarding = true;
        }
        out
    }

    /// Lines dropped since construction (malformed or over the limit).
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Bytes held for an incomplete line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Forget any buffered partial line, e.g. after a reconnect.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }
}

fn trim(line: &[u8]) -> &[u8] {
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &line[start..end]
}
