//! # Duelnet
//!
//! A two-peer session layer for turn-based board games.
//!
//! Two players connect over one TCP stream (or share a machine in Solo
//! mode), agree on who plays which side, and exchange moves with
//! authoritative clock snapshots. The rules of the game come from a
//! [`RulesEngine`](duelnet_rules::RulesEngine); drawing and input come
//! from a [`Frontend`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use duelnet::prelude::*;
//!
//! # async fn demo(frontend: &mut impl Frontend<ChessRules>) -> Result<(), DuelnetError> {
//! duelnet::init_tracing();
//! let exit = run_match(
//!     SessionConfig::host(5050),
//!     ChessRules::new,
//!     frontend,
//!     FrameConfig::default(),
//! )
//! .await?;
//! println!("left with {exit:?}");
//! # Ok(())
//! # }
//! ```

mod error;
mod runner;

pub use error::DuelnetError;
pub use runner::{Frontend, run_match, run_session};

pub use duelnet_protocol as protocol;
pub use duelnet_rules as rules;
pub use duelnet_session as session;
pub use duelnet_tick as tick;
pub use duelnet_transport as transport;

/// Installs a `tracing` subscriber reading `RUST_LOG` (default `info`).
///
/// For binaries. Does nothing if a subscriber is already installed.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// The types most programs need.
pub mod prelude {
    pub use crate::{DuelnetError, Frontend, run_match, run_session};
    pub use duelnet_protocol::{Message, Move, PromotionPiece, Side, Square};
    pub use duelnet_rules::{ChessRules, Piece, PieceKind, RulesEngine, Terminal, TerminalReason};
    pub use duelnet_session::{
        ClockPair, CollisionPolicy, InitialClocks, Intent, Mode, Role, Selection, Session,
        SessionConfig, SessionEvent, SessionExit, SessionState,
    };
    pub use duelnet_tick::{FrameConfig, FramePolicy, FrameScheduler};
    pub use duelnet_transport::{DEFAULT_PORT, local_ip};
}
