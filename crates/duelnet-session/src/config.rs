//! Session configuration: who we are, where to connect, how long the clocks run.

use std::time::Duration;

use duelnet_transport::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};
use tracing::warn;

/// Time on each clock when none is configured: ten minutes a side.
pub const DEFAULT_CLOCK: Duration = Duration::from_secs(10 * 60);

/// Host used by [`SessionConfig::join`] when given an empty host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

// ---------------------------------------------------------------------------
// Mode and Role
// ---------------------------------------------------------------------------

/// How the session reaches (or doesn't reach) a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Both sides play on this machine. No channel.
    Solo,
    /// Listen on `port` for one peer. Port 0 lets the OS pick.
    Host { port: u16 },
    /// Connect to a hosting peer.
    Join { host: String, port: u16 },
}

/// The part this process plays. Derived from [`Mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Solo,
    Host,
    Joiner,
}

impl Role {
    /// `true` for Host and Joiner: a channel exists.
    pub fn is_networked(self) -> bool {
        !matches!(self, Self::Solo)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Solo => write!(f, "Solo"),
            Self::Host => write!(f, "Host"),
            Self::Joiner => write!(f, "Joiner"),
        }
    }
}

// ---------------------------------------------------------------------------
// Clocks and collision policy
// ---------------------------------------------------------------------------

/// Starting time on each side's clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialClocks {
    pub side_a: Duration,
    pub side_b: Duration,
}

impl InitialClocks {
    /// The same time for both sides.
    pub fn even(each: Duration) -> Self {
        Self {
            side_a: each,
            side_b: each,
        }
    }
}

impl Default for InitialClocks {
    fn default() -> Self {
        Self::even(DEFAULT_CLOCK)
    }
}

/// What a peer does when the other announces the side it already holds.
///
/// Colour choices carry no acknowledgement. If both peers react to the
/// same collision by flipping, they swap sides and collide again without
/// either noticing. `HostKeeps` breaks the symmetry: only the Joiner
/// yields, so a race still ends with distinct sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Only the Joiner flips on a collision.
    #[default]
    HostKeeps,
    /// Both peers flip on a collision; a simultaneous race stays unresolved.
    BothFlip,
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Everything needed to start one game attempt.
///
/// Build one with [`solo`](Self::solo), [`host`](Self::host) or
/// [`join`](Self::join) and override fields as needed:
///
/// ```
/// use std::time::Duration;
/// use duelnet_session::{InitialClocks, SessionConfig};
///
/// let config = SessionConfig {
///     initial_clocks: InitialClocks::even(Duration::from_secs(300)),
///     ..SessionConfig::host(5050)
/// };
/// assert!(config.role().is_networked());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub mode: Mode,
    pub initial_clocks: InitialClocks,
    /// Bound on the Joiner's connect. Ignored for other modes.
    pub connect_timeout: Duration,
    pub collision_policy: CollisionPolicy,
}

impl SessionConfig {
    pub fn solo() -> Self {
        Self::with_mode(Mode::Solo)
    }

    pub fn host(port: u16) -> Self {
        Self::with_mode(Mode::Host { port })
    }

    pub fn join(host: impl Into<String>, port: u16) -> Self {
        Self::with_mode(Mode::Join {
            host: host.into(),
            port,
        })
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            initial_clocks: InitialClocks::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            collision_policy: CollisionPolicy::default(),
        }
    }

    pub fn role(&self) -> Role {
        match self.mode {
            Mode::Solo => Role::Solo,
            Mode::Host { .. } => Role::Host,
            Mode::Join { .. } => Role::Joiner,
        }
    }

    /// Replaces unusable values with defaults, logging each change.
    ///
    /// - a zero clock becomes [`DEFAULT_CLOCK`]
    /// - a zero connect timeout becomes the transport default
    /// - an empty join host becomes [`DEFAULT_HOST`], a zero join port
    ///   becomes the default port
    ///
    /// A zero *host* port is kept: it asks the OS for a free port.
    pub fn validated(mut self) -> Self {
        if self.initial_clocks.side_a.is_zero() {
            warn!("side A clock is zero, using default");
            self.initial_clocks.side_a = DEFAULT_CLOCK;
        }
        if self.initial_clocks.side_b.is_zero() {
            warn!("side B clock is zero, using default");
            self.initial_clocks.side_b = DEFAULT_CLOCK;
        }
        if self.connect_timeout.is_zero() {
            warn!("connect timeout is zero, using default");
            self.connect_timeout = DEFAULT_CONNECT_TIMEOUT;
        }
        if let Mode::Join { host, port } = &mut self.mode {
            if host.trim().is_empty() {
                warn!("join host is empty, using {DEFAULT_HOST}");
                *host = DEFAULT_HOST.to_string();
            }
            if *port == 0 {
                warn!("join port is zero, using {DEFAULT_PORT}");
                *port = DEFAULT_PORT;
            }
        }
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::solo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_classic_setup() {
        let config = SessionConfig::default();
        assert_eq!(config.mode, Mode::Solo);
        assert_eq!(config.initial_clocks, InitialClocks::even(DEFAULT_CLOCK));
        assert_eq!(config.connect_timeout, Duration::from_secs(8));
        assert_eq!(config.collision_policy, CollisionPolicy::HostKeeps);
    }

    #[test]
    fn test_role_follows_mode() {
        assert_eq!(SessionConfig::solo().role(), Role::Solo);
        assert_eq!(SessionConfig::host(5050).role(), Role::Host);
        assert_eq!(SessionConfig::join("10.0.0.2", 5050).role(), Role::Joiner);
        assert!(!Role::Solo.is_networked());
        assert!(Role::Joiner.is_networked());
    }

    #[test]
    fn test_validated_fills_zero_values() {
        let config = SessionConfig {
            initial_clocks: InitialClocks {
                side_a: Duration::ZERO,
                side_b: Duration::from_secs(60),
            },
            connect_timeout: Duration::ZERO,
            ..SessionConfig::join(" ", 0)
        }
        .validated();

        assert_eq!(config.initial_clocks.side_a, DEFAULT_CLOCK);
        assert_eq!(config.initial_clocks.side_b, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(
            config.mode,
            Mode::Join {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT
            }
        );
    }

    #[test]
    fn test_validated_keeps_ephemeral_host_port() {
        let config = SessionConfig::host(0).validated();
        assert_eq!(config.mode, Mode::Host { port: 0 });
    }
}
