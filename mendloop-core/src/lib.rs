//! Embeddable orchestration core for mendloop.
//!
//! Provides a clap-free, I/O-abstracted audit → fix → verify loop with
//! self-healing retries, suitable for linking into a host process.
//!
//! # Port traits
//!
//! All collaborator I/O is abstracted behind port traits in [`ports`]:
//! - [`Auditor`](ports::Auditor) — produce a remediation plan, exactly once
//! - [`Fixer`](ports::Fixer) — rewrite the artifact, fed the latest findings
//! - [`Verifier`](ports::Verifier) — the sole source of pass/fail truth
//! - [`HandoffSink`](ports::HandoffSink) — persist the latest findings
//! - [`Throttle`](ports::Throttle) — rate-limit delay between external calls
//! - [`RunReporter`](ports::RunReporter) — structured run lifecycle log
//!
//! The [`adapters`] module provides default filesystem-backed and scripted
//! implementations; [`process`] provides command-backed stage clients.
//!
//! # Entry points
//!
//! - [`HealingLoop::heal`](healing::HealingLoop::heal) — one artifact
//! - [`run_batch`](orchestrator::run_batch) — a whole batch + statistics

pub mod adapters;
pub mod error;
pub mod healing;
pub mod orchestrator;
pub mod ports;
pub mod process;
pub mod settings;

// Re-export the data model so embedders don't need mendloop-types directly.
pub use mendloop_types::artifact::{Artifact, AuditReport};
pub use mendloop_types::finding::{Finding, FindingSet, Verdict};
pub use mendloop_types::fix::{FixResult, FixStatus};
pub use mendloop_types::outcome::{ArtifactOutcome, ArtifactReport, IterationRecord};
pub use mendloop_types::run::RunReport;
pub use mendloop_types::stats::{RunResult, RunStatistics};
