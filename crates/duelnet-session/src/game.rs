//! The game position plus the few facts the session keeps beside it.

use duelnet_protocol::{Move, Side, Square};
use duelnet_rules::{RulesEngine, RulesError, Terminal};

/// What applying one move produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The side that made the move.
    pub side: Side,
    /// The side now to move is in check.
    pub check: bool,
    /// Set if the move ended the game.
    pub terminal: Option<Terminal>,
}

/// A rules-engine position, the last move, and the result if the game ended.
#[derive(Debug, Clone)]
pub struct GameState<R> {
    rules: R,
    last_move: Option<(Square, Square)>,
    terminal: Option<Terminal>,
}

impl<R: RulesEngine> GameState<R> {
    pub fn new(rules: R) -> Self {
        Self {
            rules,
            last_move: None,
            terminal: None,
        }
    }

    /// Read access to the engine, for rendering and queries.
    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn side_to_move(&self) -> Side {
        self.rules.side_to_move()
    }

    /// Origin and destination of the most recent move.
    pub fn last_move(&self) -> Option<(Square, Square)> {
        self.last_move
    }

    pub fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    pub fn is_over(&self) -> bool {
        self.terminal.is_some()
    }

    /// Applies `mv` and records what came of it.
    ///
    /// The engine rejects illegal moves; the position is then unchanged.
    pub(crate) fn play(&mut self, mv: Move) -> Result<MoveOutcome, RulesError> {
        let side = self.rules.side_to_move();
        self.rules.apply_move(mv)?;
        self.last_move = Some((mv.from, mv.to));
        self.terminal = self.rules.terminal();
        Ok(MoveOutcome {
            side,
            check: self.rules.is_check(),
            terminal: self.terminal,
        })
    }

    /// Records a result decided outside the engine (a clock running out).
    pub(crate) fn end(&mut self, terminal: Terminal) {
        if self.terminal.is_none() {
            self.terminal = Some(terminal);
        }
    }
}
