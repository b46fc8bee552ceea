//! Default port implementations: filesystem hand-off, sleep throttle,
//! JSONL run log, and scripted in-memory stage clients for embedding and
//! testing.

use crate::error::{AuditError, FixError, VerifyError};
use crate::ports::{Auditor, Fixer, HandoffSink, RunReporter, Throttle, Verifier};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use mendloop_types::artifact::{Artifact, AuditReport};
use mendloop_types::finding::FindingSet;
use mendloop_types::fix::FixResult;
use mendloop_types::outcome::{ArtifactReport, IterationRecord};
use mendloop_types::run::RunReport;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, warn};

/// Writes the latest findings document to a fixed path, overwriting it
/// each round.
#[derive(Debug, Clone)]
pub struct FsHandoffSink {
    pub path: Utf8PathBuf,
}

impl FsHandoffSink {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

impl HandoffSink for FsHandoffSink {
    fn publish(&self, artifact: &Artifact, findings: &FindingSet) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs_err::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", self.path))?;
        }
        let json = serde_json::to_string_pretty(findings).context("serialize findings")?;
        fs_err::write(&self.path, json).with_context(|| format!("write {}", self.path))?;
        debug!(artifact = %artifact, path = %self.path, "findings hand-off updated");
        Ok(())
    }
}

/// Records published findings in memory. For embedding and testing.
#[derive(Debug, Default)]
pub struct MemoryHandoff {
    published: RefCell<Vec<FindingSet>>,
}

impl MemoryHandoff {
    pub fn published(&self) -> Vec<FindingSet> {
        self.published.borrow().clone()
    }
}

impl HandoffSink for MemoryHandoff {
    fn publish(&self, _artifact: &Artifact, findings: &FindingSet) -> anyhow::Result<()> {
        self.published.borrow_mut().push(findings.clone());
        Ok(())
    }
}

/// Blocking sleep between external requests.
#[derive(Debug, Clone, Copy)]
pub struct SleepThrottle {
    pub delay: Duration,
}

impl SleepThrottle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Throttle for SleepThrottle {
    fn pause(&self) {
        if !self.delay.is_zero() {
            debug!(delay_ms = self.delay.as_millis() as u64, "throttling");
            std::thread::sleep(self.delay);
        }
    }
}

/// No-op throttle for tests and embedders with their own rate limiting.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoThrottle;

impl Throttle for NoThrottle {
    fn pause(&self) {}
}

/// Discards all run events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl RunReporter for NullReporter {}

/// Append-only JSONL run log, one event object per line.
///
/// Write failures are logged and swallowed: a broken log must not take the
/// run down with it.
#[derive(Debug)]
pub struct JsonlReporter {
    file: fs_err::File,
}

impl JsonlReporter {
    pub fn create(path: &Utf8Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        let file = fs_err::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open run log {}", path))?;
        Ok(Self { file })
    }

    fn emit(&mut self, event: serde_json::Value) {
        let mut line = event;
        if let Some(obj) = line.as_object_mut() {
            obj.insert(
                "ts".to_string(),
                serde_json::Value::String(Utc::now().to_rfc3339()),
            );
        }
        if let Err(err) = writeln!(self.file, "{line}") {
            warn!("run log write failed: {err}");
        }
    }
}

impl RunReporter for JsonlReporter {
    fn artifact_started(&mut self, artifact: &Artifact, index: usize, total: usize) {
        self.emit(serde_json::json!({
            "event": "artifact_started",
            "artifact": artifact,
            "index": index,
            "total": total,
        }));
    }

    fn round_completed(&mut self, artifact: &Artifact, record: &IterationRecord) {
        self.emit(serde_json::json!({
            "event": "round_completed",
            "artifact": artifact,
            "record": record,
        }));
    }

    fn artifact_finished(&mut self, report: &ArtifactReport) {
        self.emit(serde_json::json!({
            "event": "artifact_finished",
            "artifact": report.artifact,
            "outcome": report.outcome,
            "iterations": report.iterations(),
        }));
    }

    fn run_finished(&mut self, report: &RunReport) {
        self.emit(serde_json::json!({
            "event": "run_finished",
            "run_id": report.run_id,
            "result": report.result,
            "stats": report.stats,
        }));
    }
}

/// Auditor returning a fixed plan. For embedding and testing.
#[derive(Debug, Clone)]
pub struct StaticAuditor {
    report: String,
    calls: Cell<usize>,
}

impl StaticAuditor {
    pub fn new(report: impl Into<String>) -> Self {
        Self {
            report: report.into(),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Auditor for StaticAuditor {
    fn audit(&self, _artifact: &Artifact) -> Result<AuditReport, AuditError> {
        self.calls.set(self.calls.get() + 1);
        Ok(AuditReport::new(self.report.clone()))
    }
}

/// Fixer replaying a scripted sequence of results; succeeds once the
/// script runs out. Records the findings passed to the latest call.
#[derive(Debug, Default)]
pub struct ScriptedFixer {
    script: RefCell<VecDeque<Result<FixResult, FixError>>>,
    calls: Cell<usize>,
    last_findings: RefCell<Option<FindingSet>>,
}

impl ScriptedFixer {
    pub fn returning(script: Vec<Result<FixResult, FixError>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            calls: Cell::new(0),
            last_findings: RefCell::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn last_findings(&self) -> Option<FindingSet> {
        self.last_findings.borrow().clone()
    }
}

impl Fixer for ScriptedFixer {
    fn fix(
        &self,
        _artifact: &Artifact,
        _audit: &AuditReport,
        findings: Option<&FindingSet>,
    ) -> Result<FixResult, FixError> {
        self.calls.set(self.calls.get() + 1);
        *self.last_findings.borrow_mut() = findings.cloned();
        match self.script.borrow_mut().pop_front() {
            Some(result) => result,
            None => Ok(FixResult::success("scripted no-op")),
        }
    }
}

/// Verifier replaying a scripted sequence of finding sets; passes once the
/// script runs out.
#[derive(Debug, Default)]
pub struct ScriptedVerifier {
    script: RefCell<VecDeque<Result<FindingSet, VerifyError>>>,
    calls: Cell<usize>,
}

impl ScriptedVerifier {
    pub fn returning(script: Vec<Result<FindingSet, VerifyError>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Verifier for ScriptedVerifier {
    fn verify(&self, _artifact: &Artifact) -> Result<FindingSet, VerifyError> {
        self.calls.set(self.calls.get() + 1);
        match self.script.borrow_mut().pop_front() {
            Some(result) => result,
            None => Ok(FindingSet::pass()),
        }
    }
}
