//! The per-artifact healing state machine.
//!
//! Audit runs exactly once; then (fix, verify) rounds repeat until the
//! verifier passes or the retry budget is exhausted. The loop trusts only
//! the verifier's verdict — a fixer's self-reported success never counts as
//! a pass.

use crate::ports::{CancelFlag, RunReporter, StageClients, Throttle};
use mendloop_types::artifact::{Artifact, AuditReport};
use mendloop_types::finding::{FindingSet, kinds};
use mendloop_types::fix::FixResult;
use mendloop_types::outcome::{ArtifactOutcome, ArtifactReport, IterationRecord};
use tracing::{debug, info, warn};

/// Drives one artifact from audit to a terminal outcome.
pub struct HealingLoop<'a> {
    pub clients: StageClients<'a>,
    pub throttle: &'a dyn Throttle,
    pub cancel: &'a CancelFlag,
    /// Retry budget in completed (fix, verify) rounds. Must be >= 1.
    pub max_rounds: u32,
}

impl HealingLoop<'_> {
    /// Run the state machine for one artifact.
    ///
    /// Every stage failure is converted into a terminal outcome here; this
    /// never returns an error, so one broken artifact cannot abort a batch.
    pub fn heal(&self, artifact: &Artifact, reporter: &mut dyn RunReporter) -> ArtifactReport {
        debug!(artifact = %artifact, "audit stage");
        let audit = match self.clients.auditor.audit(artifact) {
            Ok(audit) => audit,
            Err(err) => {
                warn!(artifact = %artifact, error = %err, "audit failed; artifact abandoned");
                return finished(artifact, ArtifactOutcome::FailedAudit, None, Vec::new());
            }
        };

        let budget = self.max_rounds.max(1);
        let mut rounds: Vec<IterationRecord> = Vec::new();
        let mut latest: Option<FindingSet> = None;

        for round in 1..=budget {
            if self.cancel.is_cancelled() {
                info!(artifact = %artifact, round, "cancelled before fix");
                return finished(artifact, ArtifactOutcome::Cancelled, Some(audit), rounds);
            }
            if round > 1 {
                self.throttle.pause();
            }

            // The hand-off document must be current before the fixer runs.
            // Publish failures are non-fatal: the findings still reach the
            // fixer by value.
            if let Some(findings) = latest.as_ref()
                && let Err(err) = self.clients.handoff.publish(artifact, findings)
            {
                warn!(artifact = %artifact, "findings hand-off publish failed: {err:#}");
            }

            debug!(artifact = %artifact, round, "fix stage");
            let fix = match self.clients.fixer.fix(artifact, &audit, latest.as_ref()) {
                Ok(result) => result,
                Err(err) => FixResult::failure(format!("{err:#}")),
            };
            if !fix.is_success() {
                warn!(artifact = %artifact, round, "fix failed; healing aborted");
                let record = IterationRecord {
                    round,
                    fix,
                    findings: None,
                };
                reporter.round_completed(artifact, &record);
                rounds.push(record);
                return finished(artifact, ArtifactOutcome::FailedFix, Some(audit), rounds);
            }

            debug!(artifact = %artifact, round, "verify stage");
            let (findings, verify_broke) = match self.clients.verifier.verify(artifact) {
                Ok(findings) => (findings.normalized(), false),
                Err(err) => (
                    FindingSet::infra_failure(kinds::INFRA_ERROR, format!("{err:#}")),
                    true,
                ),
            };

            let passed = findings.is_pass();
            let record = IterationRecord {
                round,
                fix,
                findings: Some(findings.clone()),
            };
            reporter.round_completed(artifact, &record);
            rounds.push(record);

            if verify_broke {
                warn!(artifact = %artifact, round, "verifier infrastructure failed; never counted as a pass");
                return finished(artifact, ArtifactOutcome::FailedExhausted, Some(audit), rounds);
            }
            if passed {
                let outcome = if round == 1 {
                    ArtifactOutcome::ValidatedFirstTry
                } else {
                    ArtifactOutcome::ValidatedAfterHealing { rounds: round }
                };
                info!(artifact = %artifact, round, "verified pass");
                return finished(artifact, outcome, Some(audit), rounds);
            }

            debug!(
                artifact = %artifact,
                round,
                blocking = findings.findings.len(),
                "blocking verdict; findings handed to next round"
            );
            // Only the latest findings matter; earlier rounds are superseded.
            latest = Some(findings);
        }

        info!(artifact = %artifact, budget, "retry budget exhausted with blocking findings");
        finished(artifact, ArtifactOutcome::FailedExhausted, Some(audit), rounds)
    }
}

fn finished(
    artifact: &Artifact,
    outcome: ArtifactOutcome,
    audit: Option<AuditReport>,
    rounds: Vec<IterationRecord>,
) -> ArtifactReport {
    ArtifactReport {
        artifact: artifact.clone(),
        outcome,
        audit,
        rounds,
    }
}
