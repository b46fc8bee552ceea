//! Structured verification findings: the hand-off contract between the
//! verifier and the next fix attempt.

use serde::{Deserialize, Serialize};

/// Closed verdict enumeration, decided once at the collaborator-adapter
/// boundary. The core never matches on free-text verdict strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Blocking,
}

/// Well-known finding kinds emitted by the core and its adapters.
///
/// Collaborators are free to use their own kinds; these cover the synthetic
/// findings the core substitutes when a verifier misbehaves.
pub mod kinds {
    /// Verification tooling could not run at all.
    pub const INFRA_ERROR: &str = "infra_error";
    /// Verifier ran but produced unparseable structured output.
    pub const PARSE_ERROR: &str = "parse_error";
    /// Verifier command exited non-zero without a structured report.
    pub const CHECK_FAILED: &str = "check_failed";
}

/// A single line-addressable problem report from verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,

    #[serde(rename = "type")]
    pub kind: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suggestion: String,
}

impl Finding {
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            line: None,
            kind: kind.into(),
            description: description.into(),
            suggestion: String::new(),
        }
    }

    pub fn with_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }
}

/// Verdict plus the findings collected by one verification call.
///
/// This is also the persisted hand-off document (`findings.json`) the fixer
/// collaborator reads, so the field names follow the collaborator wire
/// contract (`blocking_errors`, `type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingSet {
    #[serde(default = "default_schema")]
    pub schema: String,

    pub verdict: Verdict,

    #[serde(default, rename = "blocking_errors")]
    pub findings: Vec<Finding>,

    /// Non-blocking, informational suggestions. Never gate the verdict.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub improvements: Vec<String>,
}

fn default_schema() -> String {
    crate::schema::MENDLOOP_FINDINGS_V1.to_string()
}

impl FindingSet {
    pub fn pass() -> Self {
        Self {
            schema: default_schema(),
            verdict: Verdict::Pass,
            findings: Vec::new(),
            improvements: Vec::new(),
        }
    }

    pub fn blocking(findings: Vec<Finding>) -> Self {
        Self {
            schema: default_schema(),
            verdict: Verdict::Blocking,
            findings,
            improvements: Vec::new(),
        }
        .normalized()
    }

    /// Synthetic blocking set describing a verification-infrastructure
    /// failure, so tooling breakage is never mistaken for a pass.
    pub fn infra_failure(kind: &str, description: impl Into<String>) -> Self {
        Self::blocking(vec![Finding::new(kind, description)])
    }

    pub fn is_pass(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// Enforce the verdict/findings invariant: a blocking verdict always
    /// carries at least one finding, and a pass carries none.
    pub fn normalized(mut self) -> Self {
        match self.verdict {
            Verdict::Pass => self.findings.clear(),
            Verdict::Blocking => {
                if self.findings.is_empty() {
                    self.findings.push(Finding::new(
                        kinds::PARSE_ERROR,
                        "verifier reported a blocking verdict without findings",
                    ));
                }
            }
        }
        self
    }
}
