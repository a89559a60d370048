//! Offline send queue and handshake ordering.
//!
//! Lines submitted while not connected are held in FIFO order. When a
//! connection is established the HELLO line goes out first, then every
//! held line, and the queue is emptied in one step.

use std::collections::VecDeque;

use bytes::Bytes;

use watchpost_core::protocol::{line, requests};

use super::state::ConnectionState;

/// What the transport must do with a submitted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendAction {
    /// Connected: write the line now.
    Write(Bytes),
    /// Held for the next connection. `connect` is set when the socket is
    /// fully unconnected and a target is known, i.e. the caller should
    /// start a connection attempt.
    Queued { connect: bool },
}

#[derive(Debug, Default)]
pub struct OutboundQueue {
    pending: VecDeque<Bytes>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, line: Bytes, state: ConnectionState, has_target: bool) -> SendAction {
        if state == ConnectionState::Connected {
            return SendAction::Write(line);
        }
        self.pending.push_back(line);
        SendAction::Queued {
            connect: state == ConnectionState::Unconnected && has_target,
        }
    }

    /// Lines to write right after connect: HELLO, then every held line in
    /// submit order. Empties the queue.
    pub fn handshake_burst(&mut self, role: &str) -> Vec<Bytes> {
        let mut out = Vec::with_capacity(self.pending.len() + 1);
        out.push(line::encode(&requests::hello(role)));
        out.extend(self.pending.drain(..));
        out
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
