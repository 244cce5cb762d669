//! Clock accounting in a Solo session driven with synthetic timestamps.

use std::time::{Duration, Instant};

use duelnet_protocol::Side;
use duelnet_rules::{ChessRules, RulesEngine, TerminalReason};
use duelnet_session::{InitialClocks, Intent, Session, SessionConfig, SessionState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TOTAL: Duration = Duration::from_secs(600);

fn config(each: Duration) -> SessionConfig {
    SessionConfig {
        initial_clocks: InitialClocks::even(each),
        ..SessionConfig::solo()
    }
}

#[tokio::test]
async fn test_remaining_plus_spent_is_the_initial_time() {
    for seed in 0..10u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let t0 = Instant::now();
        let mut session = Session::new(config(TOTAL), ChessRules::new());
        session.start(t0).await.unwrap();

        let mut now = t0;
        let mut spent_a = 0.0f64;
        let mut spent_b = 0.0f64;

        for _ in 0..60 {
            if session.state() != SessionState::Playing {
                break;
            }
            let think = Duration::from_millis(rng.random_range(0..4000));
            now += think;
            match session.game().side_to_move() {
                Side::A => spent_a += think.as_secs_f64(),
                Side::B => spent_b += think.as_secs_f64(),
            }

            let moves = session.game().rules().legal_moves();
            let mv = moves[rng.random_range(0..moves.len())];
            session.tick(now, [Intent::SubmitMove(mv)]).await;

            let clocks = session.clocks();
            assert!((clocks.remaining(Side::A) + spent_a - TOTAL.as_secs_f64()).abs() < 1e-6);
            assert!((clocks.remaining(Side::B) + spent_b - TOTAL.as_secs_f64()).abs() < 1e-6);
        }
    }
}

#[tokio::test]
async fn test_clock_hitting_zero_ends_with_the_other_side_winning() {
    let t0 = Instant::now();
    let mut session = Session::new(config(Duration::from_secs(10)), ChessRules::new());
    session.start(t0).await.unwrap();

    // A moves after 4 s, B after 3 s, then A runs out its last 6 s.
    session
        .tick(
            t0 + Duration::from_secs(4),
            [Intent::SubmitMove("e2e4".parse().unwrap())],
        )
        .await;
    session
        .tick(
            t0 + Duration::from_secs(7),
            [Intent::SubmitMove("e7e5".parse().unwrap())],
        )
        .await;
    session.tick(t0 + Duration::from_secs(12), []).await;
    assert_eq!(session.state(), SessionState::Playing);

    session.tick(t0 + Duration::from_secs(13), []).await;
    assert_eq!(session.state(), SessionState::Ended);
    let terminal = session.game().terminal().unwrap();
    assert_eq!(terminal.reason, TerminalReason::ClockExpired);
    assert_eq!(terminal.winner, Some(Side::B));
    assert_eq!(session.clocks().remaining(Side::A), 0.0);
    assert_eq!(session.clocks().remaining(Side::B), 7.0);
}

#[tokio::test]
async fn test_input_in_the_expiring_tick_is_too_late() {
    let t0 = Instant::now();
    let mut session = Session::new(config(Duration::from_secs(10)), ChessRules::new());
    session.start(t0).await.unwrap();

    // Elapsed time is charged before intents: the move never lands.
    session
        .tick(
            t0 + Duration::from_secs(10),
            [Intent::SubmitMove("e2e4".parse().unwrap())],
        )
        .await;
    assert_eq!(session.state(), SessionState::Ended);
    assert_eq!(session.game().last_move(), None);
}
