//! Move synchronization: relaying local moves and replaying the peer's.
//!
//! The sender applies its move, charges its own clock, then ships the move
//! together with both clock values. The receiver replays the move only if
//! its own engine agrees it is legal, and then adopts the sender's clocks
//! as-is. The side that just moved is the authority on how much time it
//! used, so network latency never shows up on either clock.
//!
//! There are no sequence numbers or acknowledgements. The transport's
//! in-order delivery is all this relies on.

use std::time::Instant;

use duelnet_protocol::{Message, Move, Side};
use duelnet_rules::RulesEngine;

use crate::{ClockPair, GameState, MoveOutcome};

/// Why a relayed move was thrown away.
///
/// Every variant is a protocol violation: a well-behaved peer with the
/// same position never sends one. Nothing is resynchronized afterwards.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayRejection {
    /// The notation does not describe a move.
    #[error("unreadable notation {0:?}")]
    BadNotation(String),

    /// The peer moved while it was our turn (or the game had ended).
    #[error("{notation} arrived while side {to_move} is to move")]
    OutOfTurn { notation: String, to_move: Side },

    /// Our engine says the move is illegal here.
    #[error("illegal move {0}")]
    Illegal(String),
}

/// Builds the record announcing a move we just played.
///
/// Call after the move is applied and the clocks are charged up to now.
pub fn outbound(mv: Move, clocks: &ClockPair) -> Message {
    let (side_a, side_b) = clocks.snapshot();
    Message::relay(mv, side_a, side_b)
}

/// Validates and replays a relayed move.
///
/// On success the move is applied, both clocks hold the sender's values,
/// and the outcome says whether it gave check or ended the game. On
/// rejection neither the position nor the clocks change.
///
/// `local` is this peer's side; a move is only accepted while the other
/// side is to move.
pub fn inbound<R: RulesEngine>(
    game: &mut GameState<R>,
    clocks: &mut ClockPair,
    local: Side,
    notation: &str,
    clock_a: f64,
    clock_b: f64,
    now: Instant,
) -> Result<(Move, MoveOutcome), RelayRejection> {
    let mv = game
        .rules()
        .decode_move(notation)
        .map_err(|_| RelayRejection::BadNotation(notation.to_string()))?;

    let to_move = game.side_to_move();
    if to_move == local || game.is_over() {
        return Err(RelayRejection::OutOfTurn {
            notation: notation.to_string(),
            to_move,
        });
    }
    if !game.rules().is_legal(mv) {
        return Err(RelayRejection::Illegal(notation.to_string()));
    }

    let outcome = game
        .play(mv)
        .map_err(|_| RelayRejection::Illegal(notation.to_string()))?;
    clocks.overwrite(clock_a, clock_b, now);
    Ok((mv, outcome))
}
