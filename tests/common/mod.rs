//! Common utilities for integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod test_helpers;

// Re-export commonly used items
pub use fixtures::{demo_chip, MERGE_SCRIPT, MIX_SCRIPT, SIMPLE_SCRIPT, SPLIT_SCRIPT};
pub use test_helpers::{
    assert_keyframes_sorted,
    assert_route_connected,
    play_to_end,
    replay,
};
