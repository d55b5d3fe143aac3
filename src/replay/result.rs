//! Replay output

use serde::Serialize;

use crate::contamination::ContaminationLog;
use crate::error::ReplayError;
use crate::replay::droplet::{Droplet, DropletId, DropletSnapshot};
use crate::replay::sound::SoundTimeline;

/// Everything a replay produces
///
/// Immutable once returned. Every droplet still resting at nominal size gets
/// a terminal keyframe one second after the last command processed. When a
/// violation halted the replay that is the failing command, not the last
/// command of the script, so trajectories and `max_time_ms` stop there.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayResult {
    /// Droplets indexed by id
    pub droplets: Vec<Droplet>,

    /// Earliest keyframe time, in milliseconds (never positive)
    pub min_time_ms: i64,

    /// End of the simulation, in whole seconds expressed as milliseconds
    pub max_time_ms: i64,

    pub sounds: SoundTimeline,

    /// Violations in the order they were raised
    pub errors: Vec<ReplayError>,

    pub contamination: ContaminationLog,
}

impl ReplayResult {
    /// The violation that stopped (or first disturbed) the replay
    pub fn fatal(&self) -> Option<&ReplayError> {
        self.errors.first()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn droplet(&self, id: DropletId) -> Option<&Droplet> {
        self.droplets.get(id)
    }

    /// Every droplet visible at `t` seconds
    pub fn snapshot(&self, t: f64) -> Vec<(DropletId, DropletSnapshot)> {
        self.droplets
            .iter()
            .filter_map(|droplet| droplet.state_at(t).map(|state| (droplet.id, state)))
            .collect()
    }

    /// Total number of keyframes across all droplets
    pub fn keyframe_count(&self) -> usize {
        self.droplets.iter().map(|droplet| droplet.keyframes().len()).sum()
    }

    /// Duration in seconds between `min_time_ms` and `max_time_ms`
    pub fn duration_secs(&self) -> f64 {
        (self.max_time_ms - self.min_time_ms) as f64 / 1000.0
    }
}
