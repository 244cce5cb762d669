//! Two-peer transport for Duelnet.
//!
//! Provides [`Channel`]: one ordered TCP stream carrying newline-delimited
//! [`Message`](duelnet_protocol::Message) records between exactly two
//! peers. One peer listens, the other connects; after that they are
//! symmetric.
//!
//! Background tasks own the reading (and, for the listener, the accepting)
//! and report through an inbox of [`InboundEvent`]s that the foreground
//! drains with the non-blocking [`Channel::poll`].

mod addr;
mod buffer;
mod channel;
mod error;

pub use addr::local_ip;
pub use buffer::{MAX_RECORD_LEN, RecordBuffer};
pub use channel::{
    Channel, ChannelRole, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT, Endpoint, InboundEvent,
};
pub use error::TransportError;
