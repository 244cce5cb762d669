//! Colour negotiation under random interleavings of picks and deliveries.
//!
//! Each run has two peers, each picking a random side at a random moment
//! and each announcement arriving at a random later moment. Every
//! ordering the transport allows is eventually generated.

use duelnet_protocol::Side;
use duelnet_session::{CollisionPolicy, ColorNegotiation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    HostPicks,
    JoinerPicks,
    DeliverToJoiner,
    DeliverToHost,
}

struct Run {
    host: ColorNegotiation,
    joiner: ColorNegotiation,
    /// Each peer picked before hearing from the other, and both wanted
    /// the same side.
    raced: bool,
}

fn random_side(rng: &mut StdRng) -> Side {
    if rng.random_bool(0.5) { Side::A } else { Side::B }
}

fn play(policy: CollisionPolicy, rng: &mut StdRng) -> Run {
    let mut host = ColorNegotiation::new(true, policy);
    let mut joiner = ColorNegotiation::new(false, policy);
    let host_wants = random_side(rng);
    let joiner_wants = random_side(rng);

    let mut to_joiner: Option<Side> = None;
    let mut to_host: Option<Side> = None;
    let mut host_heard_first = false;
    let mut joiner_heard_first = false;
    let mut remaining = vec![Step::HostPicks, Step::JoinerPicks];

    while !remaining.is_empty() {
        let step = remaining.swap_remove(rng.random_range(0..remaining.len()));
        match step {
            Step::HostPicks => {
                host_heard_first = host.remote().is_some();
                to_joiner = host.choose(host_wants);
                remaining.push(Step::DeliverToJoiner);
            }
            Step::JoinerPicks => {
                joiner_heard_first = joiner.remote().is_some();
                to_host = joiner.choose(joiner_wants);
                remaining.push(Step::DeliverToHost);
            }
            Step::DeliverToJoiner => joiner.receive(to_joiner.take().expect("announced")),
            Step::DeliverToHost => host.receive(to_host.take().expect("announced")),
        }
    }

    Run {
        host,
        joiner,
        raced: !host_heard_first && !joiner_heard_first && host_wants == joiner_wants,
    }
}

#[test]
fn test_host_keeps_always_ends_with_distinct_sides() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..2000 {
        let run = play(CollisionPolicy::HostKeeps, &mut rng);
        let host = run.host.resolved().expect("host resolved");
        let joiner = run.joiner.resolved().expect("joiner resolved");
        assert_ne!(host, joiner);
        assert!(run.host.flips() == 0);
        assert!(run.joiner.flips() <= 1);
    }
}

#[test]
fn test_both_flip_is_distinct_unless_the_race_happens() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut races = 0;
    for _ in 0..2000 {
        let run = play(CollisionPolicy::BothFlip, &mut rng);
        let host = run.host.resolved().expect("host resolved");
        let joiner = run.joiner.resolved().expect("joiner resolved");
        assert!(run.host.flips() <= 1 && run.joiner.flips() <= 1);
        if run.raced {
            races += 1;
            // Both flipped: still colliding, and neither can tell.
            assert_eq!(host, joiner);
        } else {
            assert_ne!(host, joiner);
        }
    }
    assert!(races > 0, "the generator should hit the race at least once");
}

#[test]
fn test_host_announcement_seen_before_joiner_picks() {
    let mut host = ColorNegotiation::new(true, CollisionPolicy::HostKeeps);
    let mut joiner = ColorNegotiation::new(false, CollisionPolicy::HostKeeps);

    let announced = host.choose(Side::A).unwrap();
    joiner.receive(announced);
    let reply = joiner.choose(Side::A).unwrap();
    host.receive(reply);

    assert_eq!(host.resolved(), Some(Side::A));
    assert_eq!(joiner.resolved(), Some(Side::B));
}

#[test]
fn test_joiner_flips_when_host_message_lands_after_its_pick() {
    let mut host = ColorNegotiation::new(true, CollisionPolicy::HostKeeps);
    let mut joiner = ColorNegotiation::new(false, CollisionPolicy::HostKeeps);

    let from_host = host.choose(Side::A).unwrap();
    let from_joiner = joiner.choose(Side::A).unwrap();
    joiner.receive(from_host);
    host.receive(from_joiner);

    assert_eq!(host.resolved(), Some(Side::A));
    assert_eq!(joiner.resolved(), Some(Side::B));
    assert_eq!(joiner.flips(), 1);
}
