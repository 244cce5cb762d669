//! Unified error type for Duelnet.

use duelnet_protocol::ProtocolError;
use duelnet_rules::RulesError;
use duelnet_session::SessionError;
use duelnet_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Callers using the `duelnet` crate deal with this one type; `?` converts
/// the layer errors through the `#[from]` impls.
#[derive(Debug, thiserror::Error)]
pub enum DuelnetError {
    /// Opening the channel failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encoding, decoding, or notation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A position or move the rules engine refused.
    #[error(transparent)]
    Rules(#[from] RulesError),

    /// Session setup or lifecycle misuse.
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectTimeout {
            addr: "10.0.0.9:5050".into(),
            timeout: Duration::from_secs(8),
        };
        let err: DuelnetError = err.into();
        assert!(matches!(err, DuelnetError::Transport(_)));
        assert!(err.to_string().contains("10.0.0.9:5050"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: DuelnetError = ProtocolError::InvalidNotation("e9e4".into()).into();
        assert!(matches!(err, DuelnetError::Protocol(_)));
        assert!(err.to_string().contains("e9e4"));
    }

    #[test]
    fn test_from_rules_error() {
        let err: DuelnetError = RulesError::IllegalMove("e2e5".into()).into();
        assert!(matches!(err, DuelnetError::Rules(_)));
    }

    #[test]
    fn test_session_transport_error_stays_transparent() {
        let inner = TransportError::InvalidEndpoint("empty host".into());
        let err: DuelnetError = SessionError::from(inner).into();
        assert!(matches!(err, DuelnetError::Session(_)));
        assert!(err.to_string().contains("empty host"));
    }
}
