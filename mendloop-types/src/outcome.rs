//! Terminal artifact outcomes and the per-artifact healing trail.

use crate::artifact::{Artifact, AuditReport};
use crate::finding::FindingSet;
use crate::fix::FixResult;
use serde::{Deserialize, Serialize};

/// Terminal state for one artifact. Computed once the healing loop
/// terminates; immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactOutcome {
    /// Verifier passed on the very first round.
    ValidatedFirstTry,
    /// Verifier passed on round `rounds` (> 1) after self-healing.
    ValidatedAfterHealing { rounds: u32 },
    /// The audit stage failed; no fix or verify was attempted.
    FailedAudit,
    /// A fix attempt errored or reported non-success.
    FailedFix,
    /// The retry budget was consumed while findings remained blocking.
    FailedExhausted,
    /// The host cancelled the run before this artifact terminated.
    Cancelled,
}

impl ArtifactOutcome {
    pub fn is_validated(&self) -> bool {
        matches!(
            self,
            Self::ValidatedFirstTry | Self::ValidatedAfterHealing { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ValidatedFirstTry => "validated (first try)",
            Self::ValidatedAfterHealing { .. } => "validated (self-healed)",
            Self::FailedAudit => "failed: audit",
            Self::FailedFix => "failed: fix",
            Self::FailedExhausted => "failed: exhausted",
            Self::Cancelled => "cancelled",
        }
    }
}

/// One entry per healing round: append-only audit trail for an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based round index.
    pub round: u32,

    pub fix: FixResult,

    /// Verifier output for this round. `None` when the round aborted before
    /// verification (fix failure), so a record with findings is exactly one
    /// completed (fix, verify) pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub findings: Option<FindingSet>,
}

/// Everything the healing loop produced for one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactReport {
    pub artifact: Artifact,

    pub outcome: ArtifactOutcome,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditReport>,

    #[serde(default)]
    pub rounds: Vec<IterationRecord>,
}

impl ArtifactReport {
    /// Completed (fix, verify) pairs. This is the unit the retry budget and
    /// the run-wide iteration counter are expressed in.
    pub fn iterations(&self) -> u32 {
        self.rounds.iter().filter(|r| r.findings.is_some()).count() as u32
    }

    /// Latest findings, for failure reporting.
    pub fn last_findings(&self) -> Option<&FindingSet> {
        self.rounds.iter().rev().find_map(|r| r.findings.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Finding;

    #[test]
    fn outcome_serializes_tagged_snake_case() {
        let v = serde_json::to_value(ArtifactOutcome::ValidatedAfterHealing { rounds: 2 })
            .expect("serialize");
        assert_eq!(v["kind"], "validated_after_healing");
        assert_eq!(v["rounds"], 2);

        let v = serde_json::to_value(ArtifactOutcome::FailedExhausted).expect("serialize");
        assert_eq!(v["kind"], "failed_exhausted");
    }

    #[test]
    fn iterations_count_only_verified_rounds() {
        let report = ArtifactReport {
            artifact: Artifact::new("a.py"),
            outcome: ArtifactOutcome::FailedFix,
            audit: None,
            rounds: vec![
                IterationRecord {
                    round: 1,
                    fix: FixResult::success("rewrote"),
                    findings: Some(FindingSet::blocking(vec![Finding::new("bug", "still broken")])),
                },
                IterationRecord {
                    round: 2,
                    fix: FixResult::failure("fixer crashed"),
                    findings: None,
                },
            ],
        };
        assert_eq!(report.iterations(), 1);
    }

    #[test]
    fn last_findings_skips_unverified_rounds() {
        let blocking = FindingSet::blocking(vec![Finding::new("bug", "nope")]);
        let report = ArtifactReport {
            artifact: Artifact::new("a.py"),
            outcome: ArtifactOutcome::FailedFix,
            audit: None,
            rounds: vec![
                IterationRecord {
                    round: 1,
                    fix: FixResult::success("rewrote"),
                    findings: Some(blocking.clone()),
                },
                IterationRecord {
                    round: 2,
                    fix: FixResult::failure("fixer crashed"),
                    findings: None,
                },
            ],
        };
        assert_eq!(report.last_findings(), Some(&blocking));
    }
}
