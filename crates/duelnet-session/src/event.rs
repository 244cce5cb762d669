//! What goes into a session each tick, and what comes out.

use std::net::SocketAddr;

use duelnet_protocol::{Move, PromotionPiece, Side, Square};
use duelnet_rules::Terminal;

/// Something the local player asked for.
///
/// The presentation layer turns clicks and key presses into intents; the
/// session decides what, if anything, each one does in the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Select a piece, or pick a destination for the selected piece.
    SelectSquare(Square),
    /// Answer a pending promotion prompt.
    Promote(PromotionPiece),
    /// Play a fully specified move.
    SubmitMove(Move),
    /// Pick a side during colour selection.
    ChooseColor(Side),
    /// Abort setup, or drop the current selection while playing.
    Cancel,
    /// Start another game once this one is over.
    NewGame,
    /// Leave for the menu.
    Exit,
}

/// Something that happened during a tick, for sounds, banners and logs.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The Host's peer arrived.
    PeerConnected { peer: SocketAddr },
    /// The peer announced its colour.
    PeerChoseColor(Side),
    /// Both colours are known; we play `local`.
    ColorsResolved { local: Side },
    /// A move was applied. `remote` is set for the peer's moves.
    MovePlayed {
        mv: Move,
        side: Side,
        check: bool,
        remote: bool,
    },
    /// A move was refused. Remote refusals are protocol violations.
    MoveRejected {
        notation: String,
        reason: String,
        remote: bool,
    },
    /// The peer disconnected mid-game.
    PeerLeft,
    /// The game ended.
    GameOver(Terminal),
}

/// Why a session handed control back to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// The player left for the menu.
    ExitToMenu,
    /// The player wants another game with the same setup.
    NewGame,
    /// Setup was cancelled or the peer vanished before play began.
    Aborted,
}

/// The piece currently picked up, with where it may go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub from: Square,
    pub targets: Vec<Square>,
}
