//! Batch driver: one healing loop per artifact, statistics folding, and
//! the overall run classification.

use crate::healing::HealingLoop;
use crate::ports::{CancelFlag, RunReporter, StageClients, Throttle};
use crate::settings::RunSettings;
use chrono::Utc;
use mendloop_types::artifact::Artifact;
use mendloop_types::run::RunReport;
use tracing::{info, warn};

/// Run the full batch in input order, one artifact at a time.
///
/// Per-artifact failures never abort the batch; the only failures that can
/// stop a run early are host cancellation (remaining artifacts are simply
/// not attempted) and whatever the caller does before invoking this.
pub fn run_batch(
    settings: &RunSettings,
    artifacts: &[Artifact],
    clients: StageClients<'_>,
    throttle: &dyn Throttle,
    cancel: &CancelFlag,
    reporter: &mut dyn RunReporter,
) -> RunReport {
    let mut report = RunReport::new(Utc::now());
    let total = artifacts.len();
    let healing = HealingLoop {
        clients,
        throttle,
        cancel,
        max_rounds: settings.round_budget(),
    };

    info!(total, max_rounds = settings.round_budget(), "run started");

    for (index, artifact) in artifacts.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(processed = index, total, "run cancelled; remaining artifacts skipped");
            break;
        }
        if index > 0 {
            throttle.pause();
        }

        reporter.artifact_started(artifact, index + 1, total);
        info!(artifact = %artifact, index = index + 1, total, "processing artifact");

        let artifact_report = healing.heal(artifact, reporter);
        if artifact_report.outcome.is_validated() {
            info!(artifact = %artifact, outcome = artifact_report.outcome.label(), "artifact done");
        } else {
            warn!(artifact = %artifact, outcome = artifact_report.outcome.label(), "artifact done");
        }

        report.stats.record(&artifact_report);
        reporter.artifact_finished(&artifact_report);
        report.artifacts.push(artifact_report);
    }

    report.result = report.stats.result();
    report.ended_at = Some(Utc::now());
    reporter.run_finished(&report);

    info!(
        validated = report.stats.validated,
        failed = report.stats.failed,
        iterations = report.stats.total_iterations,
        result = ?report.result,
        "run finished"
    );
    report
}
