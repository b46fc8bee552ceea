//! Stage-level error taxonomy.
//!
//! All three are caught inside the healing loop and converted into the
//! artifact's terminal outcome; none of them ever aborts the batch.

/// The diagnostic stage could not produce a report. Never retried; the
/// artifact terminates as `FailedAudit`.
#[derive(Debug, thiserror::Error)]
#[error("audit stage failed: {0:#}")]
pub struct AuditError(#[from] pub anyhow::Error);

/// The repair stage failed to run. Never retried within the same artifact;
/// only a fresh verification failure triggers another fix, never a fix
/// failure.
#[derive(Debug, thiserror::Error)]
#[error("fix stage failed: {0:#}")]
pub struct FixError(#[from] pub anyhow::Error);

/// The verification stage could not run or produced unparseable output.
/// Treated conservatively as a blocking verdict with a synthetic finding,
/// so tooling breakage is never reported as a pass.
#[derive(Debug, thiserror::Error)]
#[error("verify stage failed: {0:#}")]
pub struct VerifyError(#[from] pub anyhow::Error);
