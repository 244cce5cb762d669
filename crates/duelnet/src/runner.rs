//! The foreground loop: tick the session, render, repeat.

use duelnet_rules::RulesEngine;
use duelnet_session::{Intent, Session, SessionConfig, SessionEvent, SessionExit};
use duelnet_tick::{FrameConfig, FrameScheduler};
use tracing::info;

use crate::DuelnetError;

/// The presentation side of a session.
///
/// Once per frame the loop asks for the player's intents, ticks the
/// session with them, then hands the session and the frame's events back
/// for drawing. A frontend never mutates the session directly.
pub trait Frontend<R: RulesEngine> {
    /// Intents gathered since the last frame, oldest first.
    fn intents(&mut self) -> Vec<Intent>;

    /// Draws the current state. `events` are what happened this frame.
    fn render(&mut self, session: &Session<R>, events: &[SessionEvent]);
}

/// Runs a started session until it exits.
///
/// Each frame is: wait, tick with the frontend's intents, render. The
/// frame that produces the exit is still rendered.
pub async fn run_session<R, F>(
    session: &mut Session<R>,
    frontend: &mut F,
    frames: &mut FrameScheduler,
) -> SessionExit
where
    R: RulesEngine,
    F: Frontend<R> + ?Sized,
{
    loop {
        let frame = frames.wait_for_frame().await;
        let exit = session.tick(frame.now, frontend.intents()).await;
        let events = session.take_events();
        frontend.render(session, &events);
        frames.record_frame_end();

        if let Some(exit) = exit {
            return exit;
        }
    }
}

/// Plays sessions with the same setup until the player stops asking for a
/// new game.
///
/// Every game gets a fresh [`Session`], a fresh channel and a fresh
/// position from `make_rules`. Returns the exit that ended the last one.
///
/// # Errors
/// Returns [`DuelnetError::Session`] if a session fails to start (port in
/// use, peer unreachable).
pub async fn run_match<R, F>(
    config: SessionConfig,
    mut make_rules: impl FnMut() -> R,
    frontend: &mut F,
    frame_config: FrameConfig,
) -> Result<SessionExit, DuelnetError>
where
    R: RulesEngine,
    F: Frontend<R> + ?Sized,
{
    let mut frames = FrameScheduler::new(frame_config);
    let mut games = 0u32;
    loop {
        let mut session = Session::new(config.clone(), make_rules());
        session
            .start(tokio::time::Instant::now().into_std())
            .await?;
        games += 1;

        let exit = run_session(&mut session, frontend, &mut frames).await;
        info!(game = games, ?exit, "session finished");
        if exit != SessionExit::NewGame {
            return Ok(exit);
        }
    }
}
