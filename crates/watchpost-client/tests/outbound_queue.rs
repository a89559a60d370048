#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bytes::Bytes;

use watchpost_client::transport::{ConnectionState, OutboundQueue, SendAction};

fn line(s: &str) -> Bytes {
    Bytes::from(format!("{s}\n"))
}

#[test]
fn connected_writes_through() {
    let mut q = OutboundQueue::new();
    let action = q.submit(line("m"), ConnectionState::Connected, true);
    assert_eq!(action, SendAction::Write(line("m")));
    assert!(q.is_empty());
}

#[test]
fn offline_lines_queue_and_request_a_connection_only_when_idle() {
    let mut q = OutboundQueue::new();
    assert_eq!(
        q.submit(line("a"), ConnectionState::Unconnected, false),
        SendAction::Queued { connect: false }
    );
    assert_eq!(
        q.submit(line("b"), ConnectionState::Unconnected, true),
        SendAction::Queued { connect: true }
    );
    for busy in [
        ConnectionState::HostLookup,
        ConnectionState::Connecting,
        ConnectionState::Closing,
    ] {
        assert_eq!(q.submit(line("c"), busy, true), SendAction::Queued { connect: false });
    }
    assert_eq!(q.len(), 5);
}

#[test]
fn handshake_burst_puts_hello_first_and_empties_the_queue() {
    let mut q = OutboundQueue::new();
    for m in ["m1", "m2", "m3"] {
        q.submit(line(m), ConnectionState::Unconnected, false);
    }
    let burst = q.handshake_burst("admin");
    let got: Vec<&[u8]> = burst.iter().map(|b| &b[..]).collect();
    assert_eq!(
        got,
        vec![
            &b"{\"cmd\":\"HELLO\",\"role\":\"admin\"}\n"[..],
            b"m1\n",
            b"m2\n",
            b"m3\n",
        ]
    );
    assert!(q.is_empty());
    assert_eq!(q.handshake_burst("viewer").len(), 1);
}
