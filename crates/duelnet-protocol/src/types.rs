//! Core protocol types for Duelnet's wire format.
//!
//! Two peers exchange exactly two kinds of record: a colour announcement
//! during negotiation, and a move relay (with the sender's clocks) during
//! play. Everything else in this module exists to give those two records
//! strong types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// One of the two sides of the board.
///
/// Side A moves first. On the wire a side is the single letter `"A"` or
/// `"B"`; any other string is a decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
}

impl Side {
    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A board square, `a1` through `h8`.
///
/// Stored as `rank * 8 + file`, so `a1` is 0, `h1` is 7 and `h8` is 63.
/// Rank 1 is Side A's back rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    /// Builds a square from zero-based file (`a` = 0) and rank (`1` = 0).
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then(|| Self(rank * 8 + file))
    }

    /// Builds a square from its `0..64` index.
    pub fn from_index(index: u8) -> Option<Self> {
        (index < 64).then_some(Self(index))
    }

    /// Zero-based file, `a` = 0.
    pub fn file(self) -> u8 {
        self.0 % 8
    }

    /// Zero-based rank, rank `1` = 0.
    pub fn rank(self) -> u8 {
        self.0 / 8
    }

    /// The `0..64` index.
    pub fn index(self) -> u8 {
        self.0
    }

    /// Iterates all 64 squares from `a1` to `h8`.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..64).map(Self)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = char::from(b'a' + self.file());
        let rank = char::from(b'1' + self.rank());
        write!(f, "{file}{rank}")
    }
}

impl FromStr for Square {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidSquare(s.to_string());
        let &[file, rank] = s.as_bytes() else {
            return Err(invalid());
        };
        let file = file.to_ascii_lowercase();
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(invalid());
        }
        Self::new(file - b'a', rank - b'1').ok_or_else(invalid)
    }
}

// ---------------------------------------------------------------------------
// Move and its notation
// ---------------------------------------------------------------------------

/// The piece a pawn becomes when it reaches the last rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromotionPiece {
    Knight,
    Bishop,
    Rook,
    Queen,
}

impl PromotionPiece {
    /// Lowercase notation letter (`n`, `b`, `r`, `q`).
    pub fn letter(self) -> char {
        match self {
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
        }
    }

    /// Parses a notation letter, accepting either case.
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'n' => Some(Self::Knight),
            'b' => Some(Self::Bishop),
            'r' => Some(Self::Rook),
            'q' => Some(Self::Queen),
            _ => None,
        }
    }
}

/// A move as the session sees it: origin, destination, optional promotion.
///
/// Whether a move is *legal* is the rules engine's business. This type
/// only guarantees it names two real squares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PromotionPiece>,
}

impl Move {
    /// A move without promotion.
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// A pawn move that promotes to `piece`.
    pub fn promoting(from: Square, to: Square, piece: PromotionPiece) -> Self {
        Self {
            from,
            to,
            promotion: Some(piece),
        }
    }

    /// Encodes the move as `<from><to>[promotion]`, e.g. `e7e8q`.
    pub fn to_notation(&self) -> String {
        self.to_string()
    }

    /// Parses `<from><to>[promotion]`.
    pub fn from_notation(notation: &str) -> Result<Self, ProtocolError> {
        let invalid = || ProtocolError::InvalidNotation(notation.to_string());
        if !notation.is_ascii() || !(4..=5).contains(&notation.len()) {
            return Err(invalid());
        }
        let from: Square = notation[0..2].parse().map_err(|_| invalid())?;
        let to: Square = notation[2..4].parse().map_err(|_| invalid())?;
        let promotion = match notation[4..].chars().next() {
            None => None,
            Some(c) => Some(PromotionPiece::from_letter(c).ok_or_else(invalid)?),
        };
        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", piece.letter())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_notation(s)
    }
}

// ---------------------------------------------------------------------------
// Message — the two record shapes
// ---------------------------------------------------------------------------

/// A decoded wire record.
///
/// `#[serde(tag = "type")]` gives the flat shapes the peers exchange:
///
/// ```text
/// {"type":"choose","color":"A"}
/// {"type":"move","notation":"e2e4","clockA":598.2,"clockB":600.0}
/// ```
///
/// An unknown `type`, a missing field, or a wrongly typed field fails to
/// decode. Extra fields are ignored.
///
/// `notation` stays a string here: turning it into a [`Move`] happens on
/// the receive path, where a bad notation is a protocol violation rather
/// than a framing problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// "I want to play this side." Sent once per peer during negotiation.
    #[serde(rename = "choose")]
    ChooseColor { color: Side },

    /// "I just played this move; here are both clocks after it."
    #[serde(rename = "move")]
    Move {
        notation: String,
        #[serde(rename = "clockA")]
        clock_a: f64,
        #[serde(rename = "clockB")]
        clock_b: f64,
    },
}

impl Message {
    /// Builds a move relay record. Negative clock values are sent as zero.
    pub fn relay(mv: Move, clock_a: f64, clock_b: f64) -> Self {
        Self::Move {
            notation: mv.to_notation(),
            clock_a: clock_a.max(0.0),
            clock_b: clock_b.max(0.0),
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChooseColor { .. } => "choose",
            Self::Move { .. } => "move",
        }
    }
}
