//! Colour negotiation: two peers settle who plays which side with no arbiter.
//!
//! Each peer announces one choice, once. When a peer learns the other
//! wants the side it already holds, it may take the other side instead,
//! silently. There is no confirmation round.
//!
//! Two rules keep the sides apart:
//!
//! 1. **Pick time.** If the peer's choice is already known when we pick,
//!    and it matches what we want, we take the other side before
//!    announcing.
//! 2. **Receive time.** If the peer's announcement arrives after ours and
//!    matches it, one of us yields. Who yields is the
//!    [`CollisionPolicy`].

use duelnet_protocol::Side;
use tracing::{debug, info, warn};

use crate::CollisionPolicy;

/// One peer's view of the negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorNegotiation {
    is_host: bool,
    policy: CollisionPolicy,
    local: Option<Side>,
    remote: Option<Side>,
    sent: bool,
    flips: u8,
}

impl ColorNegotiation {
    pub fn new(is_host: bool, policy: CollisionPolicy) -> Self {
        Self {
            is_host,
            policy,
            local: None,
            remote: None,
            sent: false,
            flips: 0,
        }
    }

    /// Records the local pick.
    ///
    /// Returns the side to announce, or `None` if we already announced:
    /// a choice can't be changed once it is on the wire.
    pub fn choose(&mut self, desired: Side) -> Option<Side> {
        if self.sent {
            debug!(%desired, "colour already announced, ignoring pick");
            return None;
        }
        let side = if self.remote == Some(desired) {
            info!(%desired, "peer already holds that side, taking the other");
            desired.opponent()
        } else {
            desired
        };
        self.local = Some(side);
        self.sent = true;
        Some(side)
    }

    /// Records the peer's announcement, applying the receive-time rule.
    pub fn receive(&mut self, peer: Side) {
        if let Some(previous) = self.remote {
            if previous != peer {
                warn!(%previous, %peer, "peer announced a second, different colour");
            }
        }
        self.remote = Some(peer);

        let Some(local) = self.local else {
            return;
        };
        if local != peer {
            return;
        }
        let yields = match self.policy {
            CollisionPolicy::HostKeeps => !self.is_host,
            CollisionPolicy::BothFlip => true,
        };
        if yields {
            self.local = Some(local.opponent());
            self.flips += 1;
            info!(from = %local, to = %local.opponent(), "colour collision, flipped");
            if self.policy == CollisionPolicy::BothFlip {
                warn!("flip is unacknowledged; a simultaneous flip by the peer goes unnoticed");
            }
        } else {
            info!(side = %local, "colour collision, keeping side as host");
        }
    }

    /// Our side, once both choices are known.
    pub fn resolved(&self) -> Option<Side> {
        self.remote?;
        self.local
    }

    /// Our current choice, resolved or not.
    pub fn local(&self) -> Option<Side> {
        self.local
    }

    /// The peer's announced choice, for display.
    pub fn remote(&self) -> Option<Side> {
        self.remote
    }

    /// `true` once our choice is on the wire.
    pub fn has_sent(&self) -> bool {
        self.sent
    }

    /// How many times we flipped on a collision.
    pub fn flips(&self) -> u8 {
        self.flips
    }
}
