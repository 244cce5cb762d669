//! The `RulesEngine` trait — everything the session asks of the game rules.
//!
//! The session never decides legality itself. It asks the engine whose turn
//! it is, which moves are legal, and whether the game is over, and it hands
//! the engine every move (local or relayed) to apply. Any type implementing
//! this trait can be plugged into a session.

use std::fmt;

use duelnet_protocol::{Move, Side, Square};

use crate::RulesError;

// ---------------------------------------------------------------------------
// Pieces
// ---------------------------------------------------------------------------

/// The kind of a piece, independent of its side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

/// A piece standing on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(side: Side, kind: PieceKind) -> Self {
        Self { side, kind }
    }

    /// One-letter symbol: upper case for Side A, lower case for Side B.
    pub fn symbol(self) -> char {
        let c = match self.kind {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };
        match self.side {
            Side::A => c.to_ascii_uppercase(),
            Side::B => c,
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// ---------------------------------------------------------------------------
// Terminal conditions
// ---------------------------------------------------------------------------

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalReason {
    Checkmate,
    Stalemate,
    /// A side's clock reached zero. Decided by the session, not the engine.
    ClockExpired,
}

/// How a game ended. `winner` is `None` for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminal {
    pub reason: TerminalReason,
    pub winner: Option<Side>,
}

impl Terminal {
    pub fn checkmate(winner: Side) -> Self {
        Self {
            reason: TerminalReason::Checkmate,
            winner: Some(winner),
        }
    }

    pub fn stalemate() -> Self {
        Self {
            reason: TerminalReason::Stalemate,
            winner: None,
        }
    }

    /// `expired` ran out of time; the other side wins.
    pub fn clock_expired(expired: Side) -> Self {
        Self {
            reason: TerminalReason::ClockExpired,
            winner: Some(expired.opponent()),
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.reason, self.winner) {
            (TerminalReason::Checkmate, Some(w)) => write!(f, "checkmate, side {w} wins"),
            (TerminalReason::ClockExpired, Some(w)) => write!(f, "time out, side {w} wins"),
            (TerminalReason::Stalemate, _) => write!(f, "stalemate"),
            (_, None) => write!(f, "draw"),
        }
    }
}

// ---------------------------------------------------------------------------
// RulesEngine
// ---------------------------------------------------------------------------

/// The capabilities a session consumes from the game rules.
///
/// Implementors hold one position. The required methods are the primitive
/// queries; the provided ones are built on top and rarely need overriding.
///
/// `Send + 'static` so a session (and its engine) can live inside a spawned
/// task.
pub trait RulesEngine: Send + 'static {
    /// The side whose turn it is.
    fn side_to_move(&self) -> Side;

    /// Every legal move in the current position.
    fn legal_moves(&self) -> Vec<Move>;

    /// Applies `mv`, or returns [`RulesError::IllegalMove`] and leaves the
    /// position untouched.
    fn apply_move(&mut self, mv: Move) -> Result<(), RulesError>;

    /// `true` if the side to move is in check.
    fn is_check(&self) -> bool;

    /// `true` if the side to move is checkmated.
    fn is_checkmate(&self) -> bool;

    /// `true` if the side to move has no legal move and is not in check.
    fn is_stalemate(&self) -> bool;

    /// The piece on `square`, if any.
    fn piece_at(&self, square: Square) -> Option<Piece>;

    /// Every occupied square with its piece, for rendering.
    fn occupied_squares(&self) -> Vec<(Square, Piece)>;

    // ---- Provided ----

    /// Wire notation for `mv`.
    fn encode_move(&self, mv: Move) -> String {
        mv.to_notation()
    }

    /// Parses wire notation. Only checks the shape, not legality.
    fn decode_move(&self, notation: &str) -> Result<Move, RulesError> {
        Ok(Move::from_notation(notation)?)
    }

    /// `true` if `mv` is in the legal-move set.
    fn is_legal(&self, mv: Move) -> bool {
        self.legal_moves().contains(&mv)
    }

    /// Legal destinations for the piece on `from`, deduplicated (the four
    /// promotion choices share a destination).
    fn legal_targets(&self, from: Square) -> Vec<Square> {
        let mut targets: Vec<Square> = self
            .legal_moves()
            .into_iter()
            .filter(|m| m.from == from)
            .map(|m| m.to)
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }

    /// `true` if moving `from → to` is legal only with a promotion piece.
    fn needs_promotion(&self, from: Square, to: Square) -> bool {
        self.legal_moves()
            .iter()
            .any(|m| m.from == from && m.to == to && m.promotion.is_some())
    }

    /// Checkmate or stalemate in the current position, if either holds.
    fn terminal(&self) -> Option<Terminal> {
        if self.is_checkmate() {
            Some(Terminal::checkmate(self.side_to_move().opponent()))
        } else if self.is_stalemate() {
            Some(Terminal::stalemate())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_symbol_case_follows_side() {
        assert_eq!(Piece::new(Side::A, PieceKind::Knight).symbol(), 'N');
        assert_eq!(Piece::new(Side::B, PieceKind::Knight).symbol(), 'n');
        assert_eq!(Piece::new(Side::B, PieceKind::King).to_string(), "k");
    }

    #[test]
    fn test_clock_expired_winner_is_opponent() {
        let t = Terminal::clock_expired(Side::A);
        assert_eq!(t.reason, TerminalReason::ClockExpired);
        assert_eq!(t.winner, Some(Side::B));
        assert_eq!(t.to_string(), "time out, side B wins");
    }

    #[test]
    fn test_stalemate_has_no_winner() {
        assert_eq!(Terminal::stalemate().winner, None);
        assert_eq!(Terminal::stalemate().to_string(), "stalemate");
    }
}
