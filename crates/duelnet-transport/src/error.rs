use std::time::Duration;

/// Errors that can occur while opening a channel.
///
/// Once a channel is open, nothing is ever returned as an error: failures
/// surface as a single [`InboundEvent::Closed`](crate::InboundEvent::Closed)
/// in the inbox instead.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listening socket failed (port in use, no permission).
    #[error("bind to port {port} failed: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Connecting to the peer failed outright (refused, unreachable).
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The peer did not accept within the connect timeout.
    #[error("connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// The endpoint cannot be used (e.g. an empty host name).
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}
