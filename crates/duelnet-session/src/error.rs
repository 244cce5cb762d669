//! Error types for the session layer.

use crate::SessionState;

/// Errors that can occur while starting or driving a session.
///
/// Only setup can fail. Once a session is running, peer departures,
/// malformed records and rejected moves are events, not errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The channel could not be opened (bind, connect, or timeout). The
    /// session never reaches `Playing`.
    #[error(transparent)]
    Transport(#[from] duelnet_transport::TransportError),

    /// The operation isn't allowed in the session's current state, e.g.
    /// starting a session twice.
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },
}
