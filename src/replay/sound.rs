//! Sound-trigger timeline
//!
//! Cues are keyed slightly ahead of the keyframe they accompany
//! ([`SOUND_OFFSET`]) so that audio lines up with the animation.

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::replay::droplet::SOUND_OFFSET;

bitflags! {
    /// Sound effects to play at one instant
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SoundEffects: u8 {
        const MOVE      = 0b0001;
        const MERGE     = 0b0010;
        const SPLITTING = 0b0100;
        const SPLIT     = 0b1000;
    }
}

/// Sound cues keyed by trigger time in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundTimeline {
    cues: BTreeMap<i64, SoundEffects>,
}

impl SoundTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `effects` for a keyframe at `t` seconds
    pub fn trigger(&mut self, t: f64, effects: SoundEffects) {
        let key = ((t - SOUND_OFFSET) * 1000.0).round() as i64;
        *self.cues.entry(key).or_default() |= effects;
    }

    /// Effects registered exactly at `key_ms`
    pub fn at(&self, key_ms: i64) -> SoundEffects {
        self.cues.get(&key_ms).copied().unwrap_or_default()
    }

    /// Union of every cue with a key in `[from_ms, to_ms)`
    pub fn between(&self, from_ms: i64, to_ms: i64) -> SoundEffects {
        if from_ms >= to_ms {
            return SoundEffects::empty();
        }
        self.cues
            .range(from_ms..to_ms)
            .fold(SoundEffects::empty(), |acc, (_, effects)| acc | *effects)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, SoundEffects)> + '_ {
        self.cues.iter().map(|(key, effects)| (*key, *effects))
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}
