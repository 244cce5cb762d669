//! Error types for the rules layer.

/// Errors a rules engine can report.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    /// The move is not in the current legal-move set.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// A position description could not be loaded.
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    /// The wire notation does not name a move at all.
    #[error(transparent)]
    Notation(#[from] duelnet_protocol::ProtocolError),
}
