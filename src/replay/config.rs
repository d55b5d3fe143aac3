//! Replay configuration
//!
//! Two validation behaviours coexist in the history of the simulator and are
//! exposed here as flags rather than picked silently:
//!
//! - [`ErrorPolicy`]: stop at the first violation, or skip violating
//!   commands and log all of them
//! - [`SpacingMode`]: enforce the 8-neighbour separation between distinct
//!   droplets, or only forbid two droplets on the same cell

use serde::{Deserialize, Serialize};

/// What the builder does when a command violates a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Record the violation and stop replaying
    #[default]
    HaltOnFirst,

    /// Skip the violating command, record it and keep going
    CollectAll,
}

/// Minimum separation enforced between distinct droplets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacingMode {
    /// Target cell and its 8 neighbours must be free of other droplets
    #[default]
    Strict,

    /// Only the target cell itself must be free of other droplets
    Relaxed,
}

/// Replay configuration
///
/// # Example
///
/// ```rust
/// use dmfb_rs::replay::{ErrorPolicy, ReplayConfig, SpacingMode};
///
/// let config = ReplayConfig::default()
///     .error_policy(ErrorPolicy::CollectAll)
///     .seed(42);
///
/// assert_eq!(config.spacing, SpacingMode::Strict);
/// assert_eq!(config.seed, Some(42));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub error_policy: ErrorPolicy,
    pub spacing: SpacingMode,

    /// Seed for droplet colors; `None` draws one from the thread RNG
    pub seed: Option<u64>,
}

impl ReplayConfig {
    /// Builder pattern: set the error policy
    pub fn error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    /// Builder pattern: set the spacing mode
    pub fn spacing(mut self, spacing: SpacingMode) -> Self {
        self.spacing = spacing;
        self
    }

    /// Builder pattern: fix the color seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// True when replay stops at the first violation
    pub fn halts_on_error(&self) -> bool {
        self.error_policy == ErrorPolicy::HaltOnFirst
    }
}
