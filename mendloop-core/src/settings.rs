//! Clap-free settings for the healing loop and batch run.

use std::time::Duration;

/// Settings shared by every artifact in a run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Maximum completed (fix, verify) rounds per artifact. Bounds rounds,
    /// never individual collaborator invocations. Values below 1 are
    /// treated as 1.
    pub max_rounds: u32,

    /// Delay applied between artifacts and before each healing retry.
    pub delay: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            delay: Duration::from_secs(10),
        }
    }
}

impl RunSettings {
    /// Effective retry budget (`max_rounds`, floored at one round).
    pub fn round_budget(&self) -> u32 {
        self.max_rounds.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rounds_is_floored_to_one() {
        let settings = RunSettings {
            max_rounds: 0,
            ..RunSettings::default()
        };
        assert_eq!(settings.round_budget(), 1);
    }
}
