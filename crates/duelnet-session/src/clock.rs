//! Two countdown clocks, one running at a time.
//!
//! The pair doesn't know whose turn it is. Each [`advance`](ClockPair::advance)
//! names the side to charge, and the session always passes the rules
//! engine's side to move, so only one clock ever decreases.

use std::time::Instant;

use duelnet_protocol::Side;

use crate::InitialClocks;

/// Remaining time for both sides, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockPair {
    side_a: f64,
    side_b: f64,
    /// When time was last charged. `None` while stopped.
    last_tick: Option<Instant>,
}

impl ClockPair {
    /// A stopped pair holding `side_a` / `side_b` seconds.
    pub fn new(side_a: f64, side_b: f64) -> Self {
        Self {
            side_a: side_a.max(0.0),
            side_b: side_b.max(0.0),
            last_tick: None,
        }
    }

    pub fn from_initial(initial: InitialClocks) -> Self {
        Self::new(initial.side_a.as_secs_f64(), initial.side_b.as_secs_f64())
    }

    /// Seconds left for `side`.
    pub fn remaining(&self, side: Side) -> f64 {
        match side {
            Side::A => self.side_a,
            Side::B => self.side_b,
        }
    }

    /// Both values as `(side_a, side_b)`, the order they go on the wire.
    pub fn snapshot(&self) -> (f64, f64) {
        (self.side_a, self.side_b)
    }

    /// Starts charging time from `now`. No-op if already running.
    pub fn start(&mut self, now: Instant) {
        if self.last_tick.is_none() {
            self.last_tick = Some(now);
        }
    }

    /// Freezes both clocks where they are.
    pub fn stop(&mut self) {
        self.last_tick = None;
    }

    pub fn is_running(&self) -> bool {
        self.last_tick.is_some()
    }

    /// Charges the time since the last tick to `active`.
    ///
    /// Returns `Some(active)` if that clock is at zero afterwards. Values
    /// never go below zero. A stopped pair charges nothing and reports
    /// nothing.
    pub fn advance(&mut self, active: Side, now: Instant) -> Option<Side> {
        let last = self.last_tick?;
        let elapsed = now.saturating_duration_since(last).as_secs_f64();
        self.last_tick = Some(now);

        let clock = match active {
            Side::A => &mut self.side_a,
            Side::B => &mut self.side_b,
        };
        *clock = (*clock - elapsed).max(0.0);
        (*clock <= 0.0).then_some(active)
    }

    /// Replaces both values with a peer's snapshot.
    ///
    /// Time up to `now` counts as already charged: whatever the local
    /// clock showed for that interval is superseded by the snapshot.
    pub fn overwrite(&mut self, side_a: f64, side_b: f64, now: Instant) {
        self.side_a = side_a.max(0.0);
        self.side_b = side_b.max(0.0);
        if self.last_tick.is_some() {
            self.last_tick = Some(now);
        }
    }
}
