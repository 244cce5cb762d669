//! Fixed-rate frame scheduler for the Duelnet foreground loop.
//!
//! The session never blocks on the network; it is simply ticked at a
//! steady rate (60 Hz by default) and polls its channel each time. This
//! crate provides that pacing, with overrun detection and a frame-time
//! budget warning.
//!
//! # Integration
//!
//! ```ignore
//! let mut frames = FrameScheduler::new(FrameConfig::default());
//! loop {
//!     let frame = frames.wait_for_frame().await;
//!     if let Some(exit) = session.tick(frame.now, frontend.intents()).await {
//!         break exit;
//!     }
//!     frontend.render(&session, &session.take_events());
//!     frames.record_frame_end();
//! }
//! ```

use std::time::{Duration, Instant};

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a frame starts late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePolicy {
    /// Forget the missed frames and schedule the next one from now.
    #[default]
    Skip,
    /// Keep the original cadence; the next frame may follow immediately.
    Drop,
}

/// Configuration for the frame scheduler.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Frames per second. Clamped to `1..=MAX_RATE_HZ`.
    pub rate_hz: u32,
    /// Overrun handling policy.
    pub policy: FramePolicy,
    /// Fraction of the frame budget (0.0–1.0) above which a slow frame is
    /// logged. Default: 0.80.
    pub budget_warn_threshold: f64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            rate_hz: Self::DEFAULT_RATE_HZ,
            policy: FramePolicy::default(),
            budget_warn_threshold: 0.80,
        }
    }
}

impl FrameConfig {
    /// The classic game-loop rate.
    pub const DEFAULT_RATE_HZ: u32 = 60;

    /// Fastest supported rate.
    pub const MAX_RATE_HZ: u32 = 240;

    /// A config for `rate_hz` with default settings.
    pub fn with_rate(rate_hz: u32) -> Self {
        Self {
            rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`FrameScheduler::new`].
    pub fn validated(mut self) -> Self {
        let clamped = self.rate_hz.clamp(1, Self::MAX_RATE_HZ);
        if clamped != self.rate_hz {
            warn!(
                rate = self.rate_hz,
                using = clamped,
                "frame rate out of range, clamping"
            );
            self.rate_hz = clamped;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Length of one frame.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.rate_hz.max(1)))
    }
}

// ---------------------------------------------------------------------------
// Frame info
// ---------------------------------------------------------------------------

/// One frame, as returned by [`FrameScheduler::wait_for_frame`].
#[derive(Debug, Clone)]
pub struct FrameInfo {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// When the frame started. Follows tokio's clock, so paused-time tests
    /// see deterministic values.
    pub now: Instant,
    /// The frame woke up noticeably late.
    pub overrun: bool,
    /// Frames skipped because of the overrun (0 normally).
    pub skipped: u64,
}

/// Counters kept across frames.
#[derive(Debug, Clone, Default)]
pub struct FrameMetrics {
    pub total_frames: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Longest work time reported via [`FrameScheduler::record_frame_end`].
    pub max_frame_time: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Paces a loop at a fixed rate.
pub struct FrameScheduler {
    config: FrameConfig,
    frame_duration: Duration,
    frame_count: u64,
    next_frame: TokioInstant,
    /// Wall-clock start of the current frame's work.
    frame_start: Option<Instant>,
    metrics: FrameMetrics,
}

impl FrameScheduler {
    /// A scheduler whose first frame is due one frame from now.
    pub fn new(config: FrameConfig) -> Self {
        let config = config.validated();
        let frame_duration = config.frame_duration();
        debug!(
            rate_hz = config.rate_hz,
            budget_ms = frame_duration.as_secs_f64() * 1000.0,
            policy = ?config.policy,
            "frame scheduler created"
        );
        Self {
            next_frame: TokioInstant::now() + frame_duration,
            config,
            frame_duration,
            frame_count: 0,
            frame_start: None,
            metrics: FrameMetrics::default(),
        }
    }

    pub fn with_rate(rate_hz: u32) -> Self {
        Self::new(FrameConfig::with_rate(rate_hz))
    }

    /// Sleeps until the next frame is due.
    pub async fn wait_for_frame(&mut self) -> FrameInfo {
        let due = self.next_frame;
        time::sleep_until(due).await;

        let now = TokioInstant::now();
        self.frame_count += 1;
        self.frame_start = Some(Instant::now());

        // More than 10% late counts as an overrun.
        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > self.frame_duration / 10;
        let mut skipped = 0u64;

        self.next_frame = match self.config.policy {
            FramePolicy::Skip => {
                if overrun {
                    skipped = (late_by.as_nanos() / self.frame_duration.as_nanos()) as u64;
                    if skipped > 0 {
                        warn!(
                            frame = self.frame_count,
                            skipped,
                            late_ms = late_by.as_secs_f64() * 1000.0,
                            "frame overrun, skipping ahead"
                        );
                    }
                }
                now + self.frame_duration
            }
            FramePolicy::Drop => due + self.frame_duration,
        };

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += skipped;
        self.metrics.total_frames += 1;
        trace!(frame = self.frame_count, overrun, "frame");

        FrameInfo {
            frame: self.frame_count,
            now: now.into_std(),
            overrun,
            skipped,
        }
    }

    /// Marks the current frame's work as done, for budget monitoring.
    ///
    /// A no-op unless a frame is in progress.
    pub fn record_frame_end(&mut self) {
        let Some(start) = self.frame_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        if elapsed > self.metrics.max_frame_time {
            self.metrics.max_frame_time = elapsed;
        }

        let utilization = elapsed.as_secs_f64() / self.frame_duration.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                frame = self.frame_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = self.frame_duration.as_secs_f64() * 1000.0,
                "frame work near or over budget"
            );
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn rate_hz(&self) -> u32 {
        self.config.rate_hz
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }
}
