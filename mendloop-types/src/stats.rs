//! Run-wide counters and the three-way run classification.

use crate::outcome::ArtifactReport;
use serde::{Deserialize, Serialize};

/// Aggregated counters for one batch run.
///
/// Mutated incrementally as each artifact terminates; read-only afterwards.
/// Invariant: `validated + failed == total`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total: u64,
    pub validated: u64,
    pub failed: u64,
    pub first_try: u64,
    pub self_healed: u64,
    pub total_iterations: u64,
}

impl RunStatistics {
    /// Fold one terminal artifact report into the counters.
    pub fn record(&mut self, report: &ArtifactReport) {
        use crate::outcome::ArtifactOutcome::*;

        self.total += 1;
        self.total_iterations += u64::from(report.iterations());

        match report.outcome {
            ValidatedFirstTry => {
                self.validated += 1;
                self.first_try += 1;
            }
            ValidatedAfterHealing { .. } => {
                self.validated += 1;
                self.self_healed += 1;
            }
            FailedAudit | FailedFix | FailedExhausted | Cancelled => {
                self.failed += 1;
            }
        }
    }

    /// Average completed (fix, verify) rounds per artifact.
    pub fn average_iterations(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.total_iterations as f64 / self.total as f64
        }
    }

    pub fn result(&self) -> RunResult {
        if self.failed == 0 {
            RunResult::Success
        } else if self.validated > 0 {
            RunResult::PartialSuccess
        } else {
            RunResult::Failure
        }
    }
}

/// Overall run classification. The caller-visible exit code derives from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunResult {
    Success,
    PartialSuccess,
    Failure,
}

impl RunResult {
    /// Exit code 0 = full success, 1 = nothing validated, 2 = mixed.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::PartialSuccess => 2,
        }
    }
}
