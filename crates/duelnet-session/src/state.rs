//! The session lifecycle state machine.

/// Where a session is in its lifecycle.
///
/// ```text
///            Solo
///   Idle ──────────────────────────────► Playing ──► Ended
///     │                                     ▲   │
///     └──► Connecting ──► ColorSelect ──────┘   └──► PeerLeft
///               │              │
///               └──────────────┴──► Idle   (cancel / peer gone: aborted)
/// ```
///
/// - **Idle**: created, nothing started; also where an aborted setup lands.
/// - **Connecting**: the Host waits for its peer. A Joiner passes through
///   this state inside `start` and never ticks in it.
/// - **ColorSelect**: both peers pick a side.
/// - **Playing**: moves and clocks. The only state that mutates the game.
/// - **PeerLeft**: the peer disconnected mid-game. Board and clocks frozen.
/// - **Ended**: checkmate, stalemate, or a clock hit zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Connecting,
    ColorSelect,
    Playing,
    PeerLeft,
    Ended,
}

impl SessionState {
    /// Returns `true` if moving to `target` is a legal lifecycle step.
    pub fn can_transition_to(self, target: Self) -> bool {
        use SessionState::*;
        matches!(
            (self, target),
            (Idle, Connecting)
                | (Idle, Playing)
                | (Connecting, ColorSelect)
                | (Connecting, Idle)
                | (ColorSelect, Playing)
                | (ColorSelect, Idle)
                | (Playing, PeerLeft)
                | (Playing, Ended)
        )
    }

    /// `true` for the two states a game attempt can finish in.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::PeerLeft | Self::Ended)
    }

    /// `true` while setup is still running.
    pub fn is_setup(self) -> bool {
        matches!(self, Self::Connecting | Self::ColorSelect)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::ColorSelect => write!(f, "ColorSelect"),
            Self::Playing => write!(f, "Playing"),
            Self::PeerLeft => write!(f, "PeerLeft"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}
