//! The two-peer channel: one TCP stream, background tasks, and an inbox.
//!
//! ```text
//!   accept task (listen role only) ──┐
//!                                    ├──► inbox (mpsc) ──► Channel::poll()
//!   read task ───────────────────────┘
//!
//!   Channel::send() ──► write half (shared, behind an async mutex)
//! ```
//!
//! The background tasks are the only producers of events; the session loop
//! is the only consumer. The socket never leaves this module.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use duelnet_protocol::{Codec, LineCodec, Message};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::{RecordBuffer, TransportError};

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 5050;

/// How long a connecting peer waits for the listener to accept.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(8);

const READ_CHUNK: usize = 4096;

// ---------------------------------------------------------------------------
// Endpoint and events
// ---------------------------------------------------------------------------

/// Which side of the connection setup this channel plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    /// Binds a port and waits for exactly one peer.
    Listen,
    /// Dials a listening peer.
    Connect,
}

/// Where a channel listens or what it dials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Bind all interfaces on `port` (0 lets the OS pick).
    Listen { port: u16 },
    /// Dial `host:port`, giving up after `timeout`.
    Connect {
        host: String,
        port: u16,
        timeout: Duration,
    },
}

impl Endpoint {
    /// A listening endpoint on `port`.
    pub fn listen(port: u16) -> Self {
        Self::Listen { port }
    }

    /// A connecting endpoint with the default timeout.
    pub fn connect(host: impl Into<String>, port: u16) -> Self {
        Self::Connect {
            host: host.into(),
            port,
            timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// The role a channel opened on this endpoint plays.
    pub fn role(&self) -> ChannelRole {
        match self {
            Self::Listen { .. } => ChannelRole::Listen,
            Self::Connect { .. } => ChannelRole::Connect,
        }
    }
}

/// Something the background tasks observed.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// The listener accepted its peer. Never produced by a connecting channel.
    Connected { peer: SocketAddr },
    /// One decoded record.
    Message(Message),
    /// The stream ended or failed. Always the last event; at most one.
    Closed,
}

// ---------------------------------------------------------------------------
// Shared state between the channel and its tasks
// ---------------------------------------------------------------------------

struct Shared {
    /// `None` once `Closed` has been enqueued or the channel was closed.
    /// Taking the sender out is what makes `Closed` a one-shot.
    events: Mutex<Option<mpsc::UnboundedSender<InboundEvent>>>,
    /// Write half, filled in by the accept task for the listen role.
    writer: tokio::sync::Mutex<Option<OwnedWriteHalf>>,
    tasks: Mutex<Vec<AbortHandle>>,
    shut_down: AtomicBool,
}

impl Shared {
    fn new(writer: Option<OwnedWriteHalf>) -> (Arc<Self>, mpsc::UnboundedReceiver<InboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Self {
            events: Mutex::new(Some(tx)),
            writer: tokio::sync::Mutex::new(writer),
            tasks: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        });
        (shared, rx)
    }

    fn emit(&self, event: InboundEvent) {
        if let Some(tx) = lock(&self.events).as_ref() {
            let _ = tx.send(event);
        }
    }

    fn emit_closed(&self) {
        let sender = lock(&self.events).take();
        if let Some(tx) = sender {
            let _ = tx.send(InboundEvent::Closed);
            debug!("closed event enqueued");
        }
    }

    /// Records a task so `shut_down` can abort it. A task registered after
    /// shutdown is aborted on the spot.
    fn track(&self, handle: AbortHandle) {
        let mut tasks = lock(&self.tasks);
        if self.shut_down.load(Ordering::Acquire) {
            handle.abort();
        } else {
            tasks.push(handle);
        }
    }

    fn shut_down(&self) {
        self.shut_down.store(true, Ordering::Release);
        for handle in lock(&self.tasks).drain(..) {
            handle.abort();
        }
        // Drop the sender without enqueueing anything.
        lock(&self.events).take();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A framed message pipe to exactly one peer.
///
/// Opening is the only fallible operation. After that:
/// - [`send`](Self::send) never returns an error; a failed write shows up
///   as [`InboundEvent::Closed`] on a later [`poll`](Self::poll).
/// - [`poll`](Self::poll) never blocks.
/// - [`close`](Self::close) is idempotent and leaves the channel inert.
pub struct Channel {
    role: ChannelRole,
    local_addr: SocketAddr,
    inbox: mpsc::UnboundedReceiver<InboundEvent>,
    shared: Arc<Shared>,
    codec: LineCodec,
    alive: bool,
}

impl Channel {
    /// Opens a channel on `endpoint`.
    ///
    /// # Errors
    /// - [`TransportError::Bind`] if the listening port can't be bound.
    /// - [`TransportError::Connect`] / [`TransportError::ConnectTimeout`]
    ///   if the peer can't be reached. No read task is started.
    pub async fn open(endpoint: Endpoint) -> Result<Self, TransportError> {
        match endpoint {
            Endpoint::Listen { port } => Self::listen(port).await,
            Endpoint::Connect {
                host,
                port,
                timeout,
            } => Self::connect(&host, port, timeout).await,
        }
    }

    /// Binds all interfaces on `port` and accepts one peer in the background.
    ///
    /// The returned channel emits [`InboundEvent::Connected`] once the peer
    /// arrives, or [`InboundEvent::Closed`] if accepting fails.
    pub async fn listen(port: u16) -> Result<Self, TransportError> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map_err(|source| TransportError::Bind { port, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { port, source })?;
        info!(%local_addr, "waiting for peer");

        let (shared, inbox) = Shared::new(None);
        let task = tokio::spawn(accept_peer(listener, Arc::clone(&shared)));
        shared.track(task.abort_handle());

        Ok(Self {
            role: ChannelRole::Listen,
            local_addr,
            inbox,
            shared,
            codec: LineCodec,
            alive: true,
        })
    }

    /// Dials `host:port`, waiting at most `timeout`, then starts reading.
    pub async fn connect(
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(TransportError::InvalidEndpoint("empty host".into()));
        }
        let addr = format!("{host}:{port}");

        let stream = match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(TransportError::Connect { addr, source }),
            Err(_) => return Err(TransportError::ConnectTimeout { addr, timeout }),
        };
        let local_addr = stream
            .local_addr()
            .map_err(|source| TransportError::Connect {
                addr: addr.clone(),
                source,
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "could not disable Nagle");
        }
        info!(%addr, "connected to peer");

        let (reader, writer) = stream.into_split();
        let (shared, inbox) = Shared::new(Some(writer));
        let task = tokio::spawn(read_records(reader, Arc::clone(&shared)));
        shared.track(task.abort_handle());

        Ok(Self {
            role: ChannelRole::Connect,
            local_addr,
            inbox,
            shared,
            codec: LineCodec,
            alive: true,
        })
    }

    /// Sends one message, best effort.
    ///
    /// Writes the full record before returning. Does nothing if the channel
    /// is closed or (listen role) no peer has connected yet. A write failure
    /// enqueues [`InboundEvent::Closed`] instead of returning an error.
    pub async fn send(&self, message: &Message) {
        if !self.alive {
            return;
        }
        let record = match self.codec.encode(message) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, kind = message.kind(), "failed to encode message");
                return;
            }
        };

        let mut writer = self.shared.writer.lock().await;
        let Some(stream) = writer.as_mut() else {
            debug!(kind = message.kind(), "no peer stream; message dropped");
            return;
        };
        let written = stream.write_all(&record).await;
        if let Err(e) = written {
            warn!(error = %e, kind = message.kind(), "send failed");
            writer.take();
            drop(writer);
            self.shared.emit_closed();
        }
    }

    /// Takes the next pending event without blocking.
    ///
    /// Returns `None` when the inbox is empty or the channel was closed.
    pub fn poll(&mut self) -> Option<InboundEvent> {
        if !self.alive {
            return None;
        }
        self.inbox.try_recv().ok()
    }

    /// Tears the channel down: aborts background tasks and drops the socket.
    ///
    /// Idempotent. Never enqueues an event; anything still in the inbox is
    /// discarded.
    pub fn close(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.shared.shut_down();
        if let Ok(mut writer) = self.shared.writer.try_lock() {
            writer.take();
        }
        self.inbox.close();
        debug!(role = ?self.role, "channel closed");
    }

    /// `false` once [`close`](Self::close) has been called.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Which setup role this channel plays.
    pub fn role(&self) -> ChannelRole {
        self.role
    }

    /// The local socket address (the bound port for the listen role).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("role", &self.role)
            .field("local_addr", &self.local_addr)
            .field("alive", &self.alive)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Background tasks
// ---------------------------------------------------------------------------

/// Accepts exactly one peer, then hands the stream to a read task.
async fn accept_peer(listener: TcpListener, shared: Arc<Shared>) {
    let (stream, peer) = match listener.accept().await {
        Ok(accepted) => accepted,
        Err(e) => {
            warn!(error = %e, "accept failed");
            shared.emit_closed();
            return;
        }
    };
    // One connection per listener lifetime.
    drop(listener);
    info!(%peer, "peer connected");
    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "could not disable Nagle");
    }

    let (reader, writer) = stream.into_split();
    *shared.writer.lock().await = Some(writer);
    shared.emit(InboundEvent::Connected { peer });

    let task = tokio::spawn(read_records(reader, Arc::clone(&shared)));
    shared.track(task.abort_handle());
}

/// Reads until end-of-stream or error, decoding each record on its own.
///
/// The only place that ends a healthy connection's event stream.
async fn read_records(mut reader: OwnedReadHalf, shared: Arc<Shared>) {
    let codec = LineCodec;
    let mut buffer = RecordBuffer::new(codec.delimiter());
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => {
                debug!("peer closed the stream");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                debug!(error = %e, "read failed");
                break;
            }
        };

        for record in buffer.push(&chunk[..n]) {
            match codec.decode::<Message>(&record) {
                Ok(message) => shared.emit(InboundEvent::Message(message)),
                Err(e) => debug!(error = %e, len = record.len(), "dropping malformed record"),
            }
        }
    }

    shared.emit_closed();
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelnet_protocol::Side;
    use tokio::sync::mpsc::error::TryRecvError;

    #[test]
    fn test_emit_closed_is_one_shot() {
        let (shared, mut rx) = Shared::new(None);

        shared.emit_closed();
        // A second observer (read task after a failed send, or the other
        // way round) must not add anything.
        shared.emit_closed();
        shared.emit(InboundEvent::Message(Message::ChooseColor { color: Side::A }));

        assert_eq!(rx.try_recv(), Ok(InboundEvent::Closed));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn test_shut_down_enqueues_nothing() {
        let (shared, mut rx) = Shared::new(None);

        shared.shut_down();
        shared.emit_closed();

        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[tokio::test]
    async fn test_failed_write_enqueues_the_only_closed() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stream = TcpStream::connect(addr).await.unwrap();
        let (peer, _) = listener.accept().await.unwrap();
        drop(peer);

        // No read task: only `send` can notice the dead peer.
        let (_reader, writer) = stream.into_split();
        let (shared, inbox) = Shared::new(Some(writer));
        let mut channel = Channel {
            role: ChannelRole::Connect,
            local_addr: addr,
            inbox,
            shared,
            codec: LineCodec,
            alive: true,
        };

        let message = Message::ChooseColor { color: Side::B };
        for _ in 0..20 {
            channel.send(&message).await;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(channel.poll(), Some(InboundEvent::Closed));
        assert_eq!(channel.poll(), None);
        assert!(channel.shared.writer.lock().await.is_none());
    }
}
