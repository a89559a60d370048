use watchpost_core::Message;

/// Socket lifecycle as observed by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Unconnected,
    HostLookup,
    Connecting,
    Connected,
    Closing,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Unconnected => "unconnected",
            ConnectionState::HostLookup => "host_lookup",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closing => "closing",
        }
    }
}

/// Everything the transport task reports to the console, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    StateChanged(ConnectionState),
    /// One decoded inbound line.
    Message(Message),
    /// Human-readable socket error (connect failure, reset, remote close).
    Error(String),
}
