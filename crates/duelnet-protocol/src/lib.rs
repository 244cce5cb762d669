//! Wire protocol for Duelnet.
//!
//! This crate defines what two peers say to each other:
//!
//! - **Types** ([`Side`], [`Square`], [`Move`], [`Message`]) — the
//!   values that travel on the wire, plus the compact move notation.
//! - **Codec** ([`Codec`] trait, [`LineCodec`]) — how a [`Message`]
//!   becomes one delimited record and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding,
//!   decoding, or parsing notation.
//!
//! # Architecture
//!
//! The protocol layer sits below both the transport (which frames and
//! decodes records) and the session (which interprets messages). It knows
//! nothing about sockets or game state.
//!
//! ```text
//! Transport (records) → Protocol (Message) → Session (negotiation, move sync)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::LineCodec;
pub use error::ProtocolError;
pub use types::{Message, Move, PromotionPiece, Side, Square};
