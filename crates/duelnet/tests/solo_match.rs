//! Scripted Solo games driven through the foreground loop.

use std::collections::VecDeque;

use duelnet::prelude::*;

/// Replays one batch of intents per frame, then idles.
#[derive(Default)]
struct Script {
    frames: VecDeque<Vec<Intent>>,
    events: Vec<SessionEvent>,
    renders: usize,
    last_state: Option<SessionState>,
}

impl Script {
    fn new(frames: Vec<Vec<Intent>>) -> Self {
        Self {
            frames: frames.into(),
            ..Default::default()
        }
    }
}

impl<R: RulesEngine> Frontend<R> for Script {
    fn intents(&mut self) -> Vec<Intent> {
        self.frames.pop_front().unwrap_or_default()
    }

    fn render(&mut self, session: &Session<R>, events: &[SessionEvent]) {
        self.renders += 1;
        self.last_state = Some(session.state());
        self.events.extend_from_slice(events);
    }
}

fn submit(notation: &str) -> Vec<Intent> {
    vec![Intent::SubmitMove(notation.parse().unwrap())]
}

#[tokio::test(start_paused = true)]
async fn test_fools_mate_then_exit() {
    let mut script = Script::new(vec![
        submit("f2f3"),
        submit("e7e5"),
        submit("g2g4"),
        submit("d8h4"),
        vec![Intent::Exit],
    ]);

    let exit = run_match(
        SessionConfig::solo(),
        ChessRules::new,
        &mut script,
        FrameConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(exit, SessionExit::ExitToMenu);
    assert_eq!(script.last_state, Some(SessionState::Ended));
    assert_eq!(script.renders, 5);

    let played = script
        .events
        .iter()
        .filter(|e| matches!(e, SessionEvent::MovePlayed { .. }))
        .count();
    assert_eq!(played, 4);
    assert!(script.events.contains(&SessionEvent::GameOver(Terminal::checkmate(Side::B))));
}

#[tokio::test(start_paused = true)]
async fn test_new_game_starts_from_a_fresh_position() {
    let mut script = Script::new(vec![
        submit("e2e4"),
        vec![Intent::NewGame],
        // Legal only from the initial position.
        submit("e2e4"),
        vec![Intent::Exit],
    ]);
    let mut positions = 0;

    let exit = run_match(
        SessionConfig::solo(),
        || {
            positions += 1;
            ChessRules::new()
        },
        &mut script,
        FrameConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(exit, SessionExit::ExitToMenu);
    assert_eq!(positions, 2);
    let played = script
        .events
        .iter()
        .filter(|e| matches!(e, SessionEvent::MovePlayed { .. }))
        .count();
    assert_eq!(played, 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_session_returns_the_sticky_exit() {
    let mut session = Session::new(SessionConfig::solo(), ChessRules::new());
    session
        .start(tokio::time::Instant::now().into_std())
        .await
        .unwrap();
    let mut frames = FrameScheduler::with_rate(30);
    let mut script = Script::new(vec![vec![], vec![], vec![Intent::Exit]]);

    let exit = run_session(&mut session, &mut script, &mut frames).await;

    assert_eq!(exit, SessionExit::ExitToMenu);
    assert_eq!(frames.frame_count(), 3);
    assert_eq!(
        session.tick(tokio::time::Instant::now().into_std(), []).await,
        Some(SessionExit::ExitToMenu)
    );
}

#[tokio::test(start_paused = true)]
async fn test_join_failure_surfaces_as_session_error() {
    // Nothing listens on port 1 of the loopback interface.
    let mut script = Script::new(vec![]);
    let err = run_match(
        SessionConfig::join("127.0.0.1", 1),
        ChessRules::new,
        &mut script,
        FrameConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DuelnetError::Session(_)));
    assert_eq!(script.renders, 0);
}
