//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the bytes or the text were wrong, never
//! that the network was. Callers on the receive path treat every variant
//! the same way: drop the record and keep the connection open.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into a record).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing field, or an
    /// unknown `type` discriminator.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A move notation string could not be parsed.
    ///
    /// Notation is `<from><to>[promotion]`, e.g. `e2e4` or `e7e8q`.
    #[error("invalid move notation: {0:?}")]
    InvalidNotation(String),

    /// A square name could not be parsed (expected `a1`..`h8`).
    #[error("invalid square: {0:?}")]
    InvalidSquare(String),
}
