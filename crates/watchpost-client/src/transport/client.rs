//! TCP client for the console protocol.
//!
//! Responsibilities:
//! - Own the single server connection on a dedicated task
//! - Connect: host lookup -> connect -> HELLO(role) -> flush offline queue
//! - Queue outbound lines while not connected; start a connection when a
//!   send arrives on a fully unconnected socket with a known target
//! - Split inbound bytes into JSON messages and report them in order
//! - Report state changes and socket errors; never reconnect on its own
//!
//! The console reaches the task only through channels, so the task's I/O
//! thread never touches console state.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};

use watchpost_core::error::{Result, WatchpostError};
use watchpost_core::protocol::line::{self, LineDecoder};
use watchpost_core::protocol::requests::{self, DEFAULT_ROLE};
use watchpost_core::Message;

use crate::obs::{cmd_label, ConsoleMetrics};

use super::outbound::{OutboundQueue, SendAction};
use super::state::{ClientEvent, ConnectionState};

const READ_CHUNK: usize = 8 * 1024;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub role: String,
    /// Cap on a buffered partial inbound line; 0 = unbounded.
    pub max_line_bytes: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            role: DEFAULT_ROLE.to_string(),
            max_line_bytes: 0,
        }
    }
}

#[derive(Debug)]
enum Command {
    Connect { host: String, port: u16 },
    Send { cmd: String, line: Bytes },
    Disconnect,
    SetRole(String),
}

/// Handle to the transport task. Cheap to clone; every clone drives the
/// same connection.
#[derive(Clone)]
pub struct NetworkClient {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl NetworkClient {
    /// Spawn the transport task on the current tokio runtime.
    ///
    /// Returns the handle and the event stream the console consumes.
    pub fn spawn(
        opts: ClientOptions,
        metrics: Arc<ConsoleMetrics>,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Unconnected);

        let driver = Driver {
            role: opts.role,
            target: None,
            state: ConnectionState::Unconnected,
            outbound: OutboundQueue::new(),
            decoder: LineDecoder::with_max_line_bytes(opts.max_line_bytes),
            reported_drops: 0,
            connecting: None,
            reader: None,
            writer: None,
            read_buf: vec![0u8; READ_CHUNK],
            cmd_rx,
            state_tx,
            events: event_tx,
            metrics,
        };
        tokio::spawn(driver.run());

        (Self { cmd_tx, state_rx }, event_rx)
    }

    /// Start an asynchronous connection attempt. Progress is reported as
    /// `StateChanged` events.
    pub fn connect(&self, host: impl Into<String>, port: u16) -> Result<()> {
        self.command(Command::Connect {
            host: host.into(),
            port,
        })
    }

    pub fn disconnect(&self) -> Result<()> {
        self.command(Command::Disconnect)
    }

    /// Role announced in the next HELLO.
    pub fn set_role(&self, role: impl Into<String>) -> Result<()> {
        self.command(Command::SetRole(role.into()))
    }

    /// Send one message; held in the offline queue while not connected.
    pub fn send(&self, msg: &Message) -> Result<()> {
        self.command(Command::Send {
            cmd: msg.cmd().to_string(),
            line: line::encode(msg),
        })
    }

    pub fn login(&self, admin_id: &str, pw: &str) -> Result<()> {
        tracing::info!(admin_id, "login request");
        self.send(&requests::login(admin_id, pw))
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch channel that always holds the latest state.
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Fails with `Disconnected` once the transport task is gone.
    fn command(&self, cmd: Command) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| WatchpostError::Disconnected)
    }
}

enum ConnectStep {
    Resolved(io::Result<Vec<SocketAddr>>),
    Established(io::Result<TcpStream>),
}

type ConnectFuture = Pin<Box<dyn Future<Output = ConnectStep> + Send>>;

fn lookup(host: String, port: u16) -> ConnectFuture {
    Box::pin(async move {
        let res = tokio::net::lookup_host((host.as_str(), port))
            .await
            .map(|addrs| addrs.collect());
        ConnectStep::Resolved(res)
    })
}

fn establish(addrs: Vec<SocketAddr>) -> ConnectFuture {
    Box::pin(async move { ConnectStep::Established(TcpStream::connect(&addrs[..]).await) })
}

async fn next_step(fut: &mut Option<ConnectFuture>) -> ConnectStep {
    match fut.as_mut() {
        Some(f) => f.await,
        None => std::future::pending().await,
    }
}

async fn read_some(reader: &mut Option<OwnedReadHalf>, buf: &mut [u8]) -> io::Result<usize> {
    match reader.as_mut() {
        Some(r) => r.read(buf).await,
        None => std::future::pending().await,
    }
}

struct Driver {
    role: String,
    target: Option<(String, u16)>,
    state: ConnectionState,
    outbound: OutboundQueue,
    decoder: LineDecoder,
    reported_drops: u64,

    connecting: Option<ConnectFuture>,
    reader: Option<OwnedReadHalf>,
    writer: Option<OwnedWriteHalf>,
    read_buf: Vec<u8>,

    cmd_rx: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<ConnectionState>,
    events: mpsc::UnboundedSender<ClientEvent>,
    metrics: Arc<ConsoleMetrics>,
}

impl Driver {
    async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break; };
                    self.on_command(cmd).await;
                }

                step = next_step(&mut self.connecting) => {
                    self.connecting = None;
                    self.on_connect_step(step).await;
                }

                read = read_some(&mut self.reader, &mut self.read_buf) => {
                    match read {
                        Ok(0) => self.fail("remote host closed the connection".into()),
                        Ok(n) => self.on_bytes(n),
                        Err(e) => self.fail(e.to_string()),
                    }
                }
            }
        }

        if let Some(mut w) = self.writer.take() {
            let _ = w.shutdown().await;
        }
        tracing::debug!("transport task stopped");
    }

    async fn on_command(&mut self, cmd: Command) {
        match cmd {
            Command::Connect { host, port } => {
                self.target = Some((host, port));
                if self.state == ConnectionState::Unconnected {
                    self.start_connect();
                } else {
                    tracing::warn!(state = self.state.as_str(), "connect ignored; socket busy");
                }
            }
            Command::Send { cmd, line } => {
                match self.outbound.submit(line, self.state, self.target.is_some()) {
                    SendAction::Write(line) => {
                        tracing::info!(%cmd, "send");
                        self.metrics.lines_sent.inc(&[("path", "direct")]);
                        self.write(line).await;
                    }
                    SendAction::Queued { connect } => {
                        self.metrics.offline_queued.inc(&[]);
                        tracing::info!(%cmd, queue_size = self.outbound.len(), "queued (offline)");
                        if connect {
                            self.start_connect();
                        }
                    }
                }
            }
            Command::Disconnect => {
                if self.writer.is_some() {
                    self.set_state(ConnectionState::Closing);
                    if let Some(mut w) = self.writer.take() {
                        let _ = w.shutdown().await;
                    }
                }
                self.connecting = None;
                self.close();
            }
            Command::SetRole(role) => self.role = role,
        }
    }

    fn start_connect(&mut self) {
        let Some((host, port)) = self.target.clone() else {
            return;
        };
        tracing::info!(%host, port, "connecting");
        self.set_state(ConnectionState::HostLookup);
        self.connecting = Some(lookup(host, port));
    }

    async fn on_connect_step(&mut self, step: ConnectStep) {
        match step {
            ConnectStep::Resolved(Ok(addrs)) => {
                self.set_state(ConnectionState::Connecting);
                self.connecting = Some(establish(addrs));
            }
            ConnectStep::Established(Ok(stream)) => {
                let _ = stream.set_nodelay(true);
                let (r, w) = stream.into_split();
                self.reader = Some(r);
                self.writer = Some(w);
                self.set_state(ConnectionState::Connected);
                tracing::info!("connected");
                self.handshake().await;
            }
            ConnectStep::Resolved(Err(e)) | ConnectStep::Established(Err(e)) => {
                self.fail(e.to_string());
            }
        }
    }

    /// HELLO first, then the offline queue, as one contiguous write.
    async fn handshake(&mut self) {
        let burst = self.outbound.handshake_burst(&self.role);
        let flushed = burst.len() - 1;
        tracing::info!(role = %self.role, "send HELLO");
        if flushed > 0 {
            tracing::info!(count = flushed, "flush pending");
        }

        let mut buf = BytesMut::with_capacity(burst.iter().map(Bytes::len).sum());
        for line in &burst {
            buf.extend_from_slice(line);
        }
        self.metrics.lines_sent.inc(&[("path", "hello")]);
        self.metrics.lines_sent.add(&[("path", "flush")], flushed as u64);
        self.write(buf.freeze()).await;
    }

    async fn write(&mut self, bytes: Bytes) {
        let Some(w) = self.writer.as_mut() else {
            return;
        };
        if let Err(e) = w.write_all(&bytes).await {
            self.fail(e.to_string());
        }
    }

    fn on_bytes(&mut self, n: usize) {
        let msgs = self.decoder.feed(&self.read_buf[..n]);

        let dropped = self.decoder.dropped();
        if dropped > self.reported_drops {
            self.metrics.bad_lines.add(&[], dropped - self.reported_drops);
            self.reported_drops = dropped;
        }

        for msg in msgs {
            let cmd = msg.command();
            // LOGIN_OK is too chatty to log at info
            if cmd != "LOGIN_OK" {
                tracing::info!(%cmd, "recv");
            }
            self.metrics
                .messages_received
                .inc(&[("cmd", cmd_label(&cmd))]);
            let _ = self.events.send(ClientEvent::Message(msg));
        }
    }

    /// Surface an error and drop the connection (if any).
    fn fail(&mut self, err: String) {
        tracing::warn!(error = %err, "transport error");
        self.metrics.transport_errors.inc(&[]);
        let _ = self.events.send(ClientEvent::Error(err));
        self.connecting = None;
        self.close();
    }

    fn close(&mut self) {
        self.reader = None;
        self.writer = None;
        self.decoder.clear();
        self.set_state(ConnectionState::Unconnected);
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state == next {
            return;
        }
        self.state = next;
        self.state_tx.send_replace(next);
        self.metrics.connection_states.inc(&[("state", next.as_str())]);
        tracing::debug!(state = next.as_str(), "connection state");
        let _ = self.events.send(ClientEvent::StateChanged(next));
    }
}
