//! Rules-engine capability interface for Duelnet.
//!
//! The session layer delegates every question about the board to a
//! [`RulesEngine`]: whose turn it is, which moves are legal, and whether
//! the game has ended. This crate defines that trait and, behind the
//! `chess` feature (on by default), an implementation for standard chess.
//!
//! # Key types
//!
//! - [`RulesEngine`] — the trait a rules implementation provides
//! - [`Piece`] / [`PieceKind`] — what occupies a square
//! - [`Terminal`] / [`TerminalReason`] — how a game ended
//! - [`ChessRules`] — standard chess via the `chess` crate

mod engine;
mod error;

#[cfg(feature = "chess")]
mod chess_rules;

pub use engine::{Piece, PieceKind, RulesEngine, Terminal, TerminalReason};
pub use error::RulesError;

#[cfg(feature = "chess")]
pub use chess_rules::ChessRules;
