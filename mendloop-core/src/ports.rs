//! Port traits abstracting all collaborator I/O away from the loop.

use crate::error::{AuditError, FixError, VerifyError};
use mendloop_types::artifact::{Artifact, AuditReport};
use mendloop_types::finding::FindingSet;
use mendloop_types::fix::FixResult;
use mendloop_types::outcome::{ArtifactReport, IterationRecord};
use mendloop_types::run::RunReport;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Diagnostic stage: produce a remediation plan for an artifact.
///
/// Called exactly once per artifact, before any fix. Must not mutate the
/// artifact's content.
pub trait Auditor {
    fn audit(&self, artifact: &Artifact) -> Result<AuditReport, AuditError>;
}

/// Repair stage: rewrite the artifact's content in place.
///
/// `findings` is `None` on the first attempt (the audit report is the only
/// guidance) and the latest verifier output on every retry. On a returned
/// failure the artifact's content is whatever the collaborator left behind;
/// the core makes no atomicity guarantee across this boundary.
pub trait Fixer {
    fn fix(
        &self,
        artifact: &Artifact,
        audit: &AuditReport,
        findings: Option<&FindingSet>,
    ) -> Result<FixResult, FixError>;
}

/// Verification stage: the sole source of pass/fail truth.
///
/// Must be idempotent: verifying unchanged content twice yields the same
/// verdict and the same blocking findings.
pub trait Verifier {
    fn verify(&self, artifact: &Artifact) -> Result<FindingSet, VerifyError>;
}

/// Persists the latest findings document for the artifact currently being
/// healed, overwritten each round, so a fixer collaborator can read it as
/// part of its own context-gathering.
pub trait HandoffSink {
    fn publish(&self, artifact: &Artifact, findings: &FindingSet) -> anyhow::Result<()>;
}

/// Rate-limit delay applied between artifacts and before each healing
/// retry. Pure side effect, no bearing on correctness.
pub trait Throttle {
    fn pause(&self);
}

/// Structured run lifecycle log, passed explicitly into the orchestrator —
/// never a process global.
#[allow(unused_variables)]
pub trait RunReporter {
    fn artifact_started(&mut self, artifact: &Artifact, index: usize, total: usize) {}
    fn round_completed(&mut self, artifact: &Artifact, record: &IterationRecord) {}
    fn artifact_finished(&mut self, report: &ArtifactReport) {}
    fn run_finished(&mut self, report: &RunReport) {}
}

/// Borrowed bundle of the three stage clients plus the hand-off sink.
#[derive(Clone, Copy)]
pub struct StageClients<'a> {
    pub auditor: &'a dyn Auditor,
    pub fixer: &'a dyn Fixer,
    pub verifier: &'a dyn Verifier,
    pub handoff: &'a dyn HandoffSink,
}

/// Cooperative cancellation signal, checked between rounds and between
/// artifacts. A cancelled artifact terminates as `Cancelled` without
/// corrupting statistics counted so far.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
