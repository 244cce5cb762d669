//! The session layer for Duelnet.
//!
//! Composes the transport, the wire protocol and a rules engine into one
//! game attempt:
//!
//! 1. **Setup** — open the channel (Host listens, Joiner connects)
//! 2. **Colour negotiation** — both peers pick a side ([`ColorNegotiation`])
//! 3. **Play** — local moves are relayed with both clocks, peer moves are
//!    checked and replayed ([`sync`])
//! 4. **End** — checkmate, stalemate, a flag falling, or the peer leaving
//!
//! # How it fits in the stack
//!
//! ```text
//! Presentation (above)  ← feeds Intents, renders Session state each tick
//!     ↕
//! Session Layer (this crate)  ← Session, ClockPair, ColorNegotiation
//!     ↕
//! Transport + Protocol + Rules (below)
//! ```

mod clock;
mod config;
mod error;
mod event;
mod game;
mod negotiation;
mod session;
mod state;
pub mod sync;

pub use clock::ClockPair;
pub use config::{
    CollisionPolicy, DEFAULT_CLOCK, DEFAULT_HOST, InitialClocks, Mode, Role, SessionConfig,
};
pub use error::SessionError;
pub use event::{Intent, Selection, SessionEvent, SessionExit};
pub use game::{GameState, MoveOutcome};
pub use negotiation::ColorNegotiation;
pub use session::Session;
pub use state::SessionState;
