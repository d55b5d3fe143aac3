//! Helper functions for integration tests

use dmfb_rs::replay::{compile_and_replay, ReplayConfig, ReplayResult};
use dmfb_rs::session::{PlaybackEvents, Session};
use dmfb_rs::wash::WashRoute;

use super::fixtures::demo_chip;

/// Replay a script on the demo chip with a fixed seed
pub fn replay(script: &str) -> ReplayResult {
    compile_and_replay(script, &demo_chip(), &ReplayConfig::default().seed(7))
        .expect("fixture scripts compile")
}

/// Keyframes of every droplet are in non-decreasing time order
pub fn assert_keyframes_sorted(result: &ReplayResult) {
    for droplet in &result.droplets {
        for pair in droplet.keyframes().windows(2) {
            assert!(
                pair[0].t <= pair[1].t,
                "droplet {}: keyframe at {} follows {}",
                droplet.id, pair[1].t, pair[0].t
            );
        }
    }
}

/// Consecutive route steps are orthogonal neighbours
pub fn assert_route_connected(route: &WashRoute) {
    for (i, pair) in route.steps().windows(2).enumerate() {
        assert_eq!(
            pair[0].manhattan(pair[1]),
            1,
            "step {} jumps from {} to {}",
            i, pair[0], pair[1]
        );
    }
}

/// Drive the clock with fixed ticks until the end, collecting every event
pub fn play_to_end(session: &mut Session, tick_ms: i64) -> Vec<PlaybackEvents> {
    let mut events = Vec::new();
    loop {
        let tick = session.advance(tick_ms);
        let finished = tick.finished;
        events.push(tick);
        if finished {
            return events;
        }
    }
}
