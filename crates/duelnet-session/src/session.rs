//! The session: one game attempt from setup to the final position.
//!
//! A [`Session`] owns everything about the attempt: the channel (if any),
//! the colour negotiation, the game position and the clocks. It is driven
//! by a foreground loop calling [`tick`](Session::tick) at a fixed rate.
//! Each tick does three things, always in this order:
//!
//! 1. drain every event the channel has queued, in arrival order
//! 2. charge elapsed time to the side to move (while `Playing`)
//! 3. act on the local player's intents
//!
//! Nothing else mutates the position or the clocks, so neither needs any
//! locking. The channel's inbox is the only thing shared with another task.

use std::net::SocketAddr;
use std::time::Instant;

use duelnet_protocol::{Message, Move, Side, Square};
use duelnet_rules::{RulesEngine, Terminal};
use duelnet_transport::{Channel, InboundEvent};
use tracing::{debug, info, warn};

use crate::sync;
use crate::{
    ClockPair, ColorNegotiation, GameState, Intent, Mode, Role, Selection, SessionConfig,
    SessionError, SessionEvent, SessionExit, SessionState,
};

/// One game attempt between two sides, local or networked.
///
/// ## Lifecycle
///
/// ```text
/// new() ──► start() ──► tick() … tick() ──► Some(SessionExit)
/// ```
///
/// `start` opens the channel (Host, Joiner) or goes straight to play
/// (Solo). After that, `tick` returns `None` until the player leaves or
/// setup is aborted. A session is never restarted: on
/// [`SessionExit::NewGame`] the owner builds a fresh one.
pub struct Session<R> {
    config: SessionConfig,
    role: Role,
    state: SessionState,
    /// Our side once negotiated. Always `None` in Solo.
    local_side: Option<Side>,
    /// Exists from `start` until the session leaves or the peer does.
    channel: Option<Channel>,
    negotiation: ColorNegotiation,
    game: GameState<R>,
    clocks: ClockPair,
    selection: Option<Selection>,
    pending_promotion: Option<(Square, Square)>,
    peer: Option<SocketAddr>,
    listen_addr: Option<SocketAddr>,
    violations: u32,
    events: Vec<SessionEvent>,
    exit: Option<SessionExit>,
}

impl<R: RulesEngine> Session<R> {
    /// Creates an idle session. Nothing touches the network until
    /// [`start`](Self::start).
    pub fn new(config: SessionConfig, rules: R) -> Self {
        let config = config.validated();
        let role = config.role();
        Self {
            negotiation: ColorNegotiation::new(role == Role::Host, config.collision_policy),
            clocks: ClockPair::from_initial(config.initial_clocks),
            game: GameState::new(rules),
            config,
            role,
            state: SessionState::Idle,
            local_side: None,
            channel: None,
            selection: None,
            pending_promotion: None,
            peer: None,
            listen_addr: None,
            violations: 0,
            events: Vec::new(),
            exit: None,
        }
    }

    /// Starts the session.
    ///
    /// - **Solo**: straight to `Playing`; the clocks start at `now`.
    /// - **Host**: binds the port and moves to `Connecting`; the peer is
    ///   picked up by a later tick.
    /// - **Joiner**: connects within the configured timeout and moves on to
    ///   `ColorSelect`.
    ///
    /// # Errors
    /// - [`SessionError::Transport`] if binding or connecting fails. The
    ///   session stays `Idle` and should be discarded.
    /// - [`SessionError::InvalidTransition`] if already started.
    pub async fn start(&mut self, now: Instant) -> Result<(), SessionError> {
        if self.state != SessionState::Idle || self.exit.is_some() {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                action: "start",
            });
        }

        match self.config.mode.clone() {
            Mode::Solo => {
                self.transition(SessionState::Playing);
                self.clocks.start(now);
            }
            Mode::Host { port } => {
                let channel = Channel::listen(port).await?;
                self.listen_addr = Some(channel.local_addr());
                self.channel = Some(channel);
                self.transition(SessionState::Connecting);
            }
            Mode::Join { host, port } => {
                let channel = Channel::connect(&host, port, self.config.connect_timeout).await?;
                self.channel = Some(channel);
                // The connect itself was the Connecting phase.
                self.transition(SessionState::Connecting);
                self.transition(SessionState::ColorSelect);
            }
        }
        Ok(())
    }

    /// Runs one foreground step: channel events, then clocks, then intents.
    ///
    /// Returns `Some` once the session is done; the same value is returned
    /// by every later call.
    pub async fn tick(
        &mut self,
        now: Instant,
        intents: impl IntoIterator<Item = Intent>,
    ) -> Option<SessionExit> {
        if self.exit.is_some() {
            return self.exit;
        }

        self.drain_channel(now);

        if self.state == SessionState::Playing {
            self.advance_clocks(now);
        }

        for intent in intents {
            if self.exit.is_some() {
                break;
            }
            self.handle_intent(intent, now).await;
        }
        self.exit
    }

    /// Takes the events produced since the last call.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- Accessors ----

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The side this peer plays. `None` in Solo and before negotiation ends.
    pub fn local_side(&self) -> Option<Side> {
        self.local_side
    }

    /// The side drawn nearest the viewer: our own side when networked,
    /// Side A otherwise.
    pub fn side_at_bottom(&self) -> Side {
        self.local_side.unwrap_or(Side::A)
    }

    pub fn clocks(&self) -> &ClockPair {
        &self.clocks
    }

    pub fn game(&self) -> &GameState<R> {
        &self.game
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Origin and destination of a pawn move waiting for
    /// [`Intent::Promote`].
    pub fn pending_promotion(&self) -> Option<(Square, Square)> {
        self.pending_promotion
    }

    pub fn negotiation(&self) -> &ColorNegotiation {
        &self.negotiation
    }

    /// The Host's peer, once connected.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Where the Host is listening (useful when port 0 was requested).
    pub fn listen_addr(&self) -> Option<SocketAddr> {
        self.listen_addr
    }

    /// How many relayed moves were thrown away.
    pub fn protocol_violations(&self) -> u32 {
        self.violations
    }

    /// `true` if a local move would be accepted right now.
    pub fn can_move_locally(&self) -> bool {
        if self.state != SessionState::Playing || self.game.is_over() {
            return false;
        }
        match self.local_side {
            None => true,
            Some(side) => side == self.game.side_to_move(),
        }
    }

    // ---- State changes ----

    /// Moves to `to`, refusing steps the lifecycle doesn't allow.
    fn transition(&mut self, to: SessionState) {
        if !self.state.can_transition_to(to) {
            warn!(role = %self.role, from = %self.state, %to, "invalid session transition refused");
            return;
        }
        info!(role = %self.role, from = %self.state, %to, "session state changed");
        self.state = to;
    }

    fn close_channel(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
    }

    /// Setup failed or was cancelled: back to `Idle`, no game.
    fn abort(&mut self, why: &str) {
        info!(role = %self.role, state = %self.state, why, "session aborted");
        self.close_channel();
        self.transition(SessionState::Idle);
        self.exit = Some(SessionExit::Aborted);
    }

    /// The player walks away from a running or finished game.
    fn leave(&mut self, exit: SessionExit) {
        self.close_channel();
        self.clocks.stop();
        self.exit = Some(exit);
    }

    fn finish(&mut self, terminal: Terminal) {
        self.game.end(terminal);
        self.clocks.stop();
        self.selection = None;
        self.pending_promotion = None;
        self.transition(SessionState::Ended);
        info!(%terminal, "game over");
        self.events.push(SessionEvent::GameOver(terminal));
    }

    fn try_resolve(&mut self, now: Instant) {
        if self.state != SessionState::ColorSelect {
            return;
        }
        if let Some(side) = self.negotiation.resolved() {
            self.local_side = Some(side);
            self.transition(SessionState::Playing);
            self.clocks.start(now);
            self.events.push(SessionEvent::ColorsResolved { local: side });
        }
    }

    // ---- Channel events ----

    fn drain_channel(&mut self, now: Instant) {
        loop {
            if !matches!(
                self.state,
                SessionState::Connecting | SessionState::ColorSelect | SessionState::Playing
            ) {
                break;
            }
            let Some(event) = self.channel.as_mut().and_then(Channel::poll) else {
                break;
            };
            match event {
                InboundEvent::Connected { peer } => self.on_connected(peer),
                InboundEvent::Message(Message::ChooseColor { color }) => {
                    self.on_peer_color(color, now)
                }
                InboundEvent::Message(Message::Move {
                    notation,
                    clock_a,
                    clock_b,
                }) => self.on_peer_move(&notation, clock_a, clock_b, now),
                InboundEvent::Closed => self.on_closed(),
            }
        }
    }

    fn on_connected(&mut self, peer: SocketAddr) {
        if self.state != SessionState::Connecting {
            debug!(%peer, state = %self.state, "unexpected connected event");
            return;
        }
        self.peer = Some(peer);
        self.transition(SessionState::ColorSelect);
        self.events.push(SessionEvent::PeerConnected { peer });
    }

    fn on_peer_color(&mut self, color: Side, now: Instant) {
        if self.state != SessionState::ColorSelect {
            debug!(%color, state = %self.state, "colour announcement outside selection ignored");
            return;
        }
        self.negotiation.receive(color);
        self.events.push(SessionEvent::PeerChoseColor(color));
        self.try_resolve(now);
    }

    fn on_peer_move(&mut self, notation: &str, clock_a: f64, clock_b: f64, now: Instant) {
        let Some(local) = self.local_side.filter(|_| self.state == SessionState::Playing) else {
            self.reject_remote(notation, "move before colours were settled".to_string());
            return;
        };

        match sync::inbound(
            &mut self.game,
            &mut self.clocks,
            local,
            notation,
            clock_a,
            clock_b,
            now,
        ) {
            Ok((mv, outcome)) => {
                debug!(%mv, side = %outcome.side, "peer move applied");
                self.events.push(SessionEvent::MovePlayed {
                    mv,
                    side: outcome.side,
                    check: outcome.check,
                    remote: true,
                });
                if let Some(terminal) = outcome.terminal {
                    self.finish(terminal);
                }
            }
            Err(rejection) => self.reject_remote(notation, rejection.to_string()),
        }
    }

    fn reject_remote(&mut self, notation: &str, reason: String) {
        self.violations += 1;
        warn!(
            notation,
            reason = %reason,
            total = self.violations,
            "protocol violation: relayed move discarded"
        );
        self.events.push(SessionEvent::MoveRejected {
            notation: notation.to_string(),
            reason,
            remote: true,
        });
    }

    fn on_closed(&mut self) {
        match self.state {
            SessionState::Connecting | SessionState::ColorSelect => {
                self.abort("peer closed the connection during setup");
            }
            SessionState::Playing => {
                self.close_channel();
                self.clocks.stop();
                self.selection = None;
                self.pending_promotion = None;
                self.transition(SessionState::PeerLeft);
                self.events.push(SessionEvent::PeerLeft);
            }
            _ => {}
        }
    }

    // ---- Clocks ----

    fn advance_clocks(&mut self, now: Instant) {
        let side = self.game.side_to_move();
        if let Some(expired) = self.clocks.advance(side, now) {
            info!(side = %expired, "clock expired");
            self.finish(Terminal::clock_expired(expired));
        }
    }

    // ---- Local intents ----

    async fn handle_intent(&mut self, intent: Intent, now: Instant) {
        use SessionState::*;

        match (self.state, intent) {
            (ColorSelect, Intent::ChooseColor(side)) => {
                if let Some(announce) = self.negotiation.choose(side) {
                    self.send(&Message::ChooseColor { color: announce }).await;
                }
                self.try_resolve(now);
            }
            (Connecting | ColorSelect, Intent::Cancel | Intent::Exit) => {
                self.abort("cancelled by player");
            }
            (Playing, Intent::Cancel) => {
                self.selection = None;
                self.pending_promotion = None;
            }
            (Playing, Intent::SelectSquare(square)) => self.select(square).await,
            (Playing, Intent::SubmitMove(mv)) => self.play_local(mv).await,
            (Playing, Intent::Promote(piece)) => {
                if let Some((from, to)) = self.pending_promotion.take() {
                    self.play_local(Move::promoting(from, to, piece)).await;
                }
            }
            (Idle | Playing | PeerLeft | Ended, Intent::Exit) => self.leave(SessionExit::ExitToMenu),
            (Playing | Ended, Intent::NewGame) => self.leave(SessionExit::NewGame),
            (state, intent) => debug!(%state, ?intent, "intent ignored"),
        }
    }

    /// Click handling: pick up a piece, move it, or drop the selection.
    async fn select(&mut self, square: Square) {
        // Any click while the promotion prompt is up dismisses it.
        if self.pending_promotion.take().is_some() {
            self.selection = None;
            return;
        }
        if !self.can_move_locally() {
            return;
        }

        if let Some(selection) = self.selection.take() {
            if selection.targets.contains(&square) {
                if self.game.rules().needs_promotion(selection.from, square) {
                    self.pending_promotion = Some((selection.from, square));
                } else {
                    self.play_local(Move::new(selection.from, square)).await;
                }
                return;
            }
        }

        let to_move = self.game.side_to_move();
        if let Some(piece) = self.game.rules().piece_at(square) {
            if piece.side == to_move {
                self.selection = Some(Selection {
                    from: square,
                    targets: self.game.rules().legal_targets(square),
                });
            }
        }
    }

    async fn play_local(&mut self, mv: Move) {
        self.selection = None;
        self.pending_promotion = None;

        if !self.can_move_locally() {
            self.events.push(SessionEvent::MoveRejected {
                notation: mv.to_notation(),
                reason: "not this side's turn".to_string(),
                remote: false,
            });
            return;
        }

        let outcome = match self.game.play(mv) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(%mv, error = %e, "local move refused");
                self.events.push(SessionEvent::MoveRejected {
                    notation: mv.to_notation(),
                    reason: e.to_string(),
                    remote: false,
                });
                return;
            }
        };

        debug!(%mv, side = %outcome.side, "local move applied");
        self.events.push(SessionEvent::MovePlayed {
            mv,
            side: outcome.side,
            check: outcome.check,
            remote: false,
        });

        // Clocks were charged up to `now` earlier in this tick.
        if self.role.is_networked() {
            let relay = sync::outbound(mv, &self.clocks);
            self.send(&relay).await;
        }
        if let Some(terminal) = outcome.terminal {
            self.finish(terminal);
        }
    }

    async fn send(&self, message: &Message) {
        if let Some(channel) = &self.channel {
            channel.send(message).await;
        }
    }
}

impl<R> std::fmt::Debug for Session<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .field("state", &self.state)
            .field("local_side", &self.local_side)
            .field("channel", &self.channel)
            .field("clocks", &self.clocks)
            .field("violations", &self.violations)
            .field("exit", &self.exit)
            .finish_non_exhaustive()
    }
}
