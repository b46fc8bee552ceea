//! Outcome of one fixer invocation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixStatus {
    Success,
    Failure,
}

/// Result of one repair step.
///
/// `Success` means the repair completed without infrastructure error, not
/// that the artifact is correct; only the verifier decides pass/fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixResult {
    pub status: FixStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FixResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: FixStatus::Success,
            message: Some(message.into()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: FixStatus::Failure,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FixStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        let ok = serde_json::to_value(FixStatus::Success).expect("serialize");
        let bad = serde_json::to_value(FixStatus::Failure).expect("serialize");
        assert_eq!(ok, serde_json::json!("success"));
        assert_eq!(bad, serde_json::json!("failure"));
    }

    #[test]
    fn message_is_omitted_when_none() {
        let r = FixResult {
            status: FixStatus::Success,
            message: None,
        };
        let v = serde_json::to_value(&r).expect("serialize");
        assert!(v.get("message").is_none());
    }
}
