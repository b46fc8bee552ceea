//! The persisted run report (`report.json`).

use crate::outcome::ArtifactReport;
use crate::stats::{RunResult, RunStatistics};
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub schema: String,

    pub run_id: Uuid,

    /// Directory the batch was collected from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Utf8PathBuf>,

    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    pub result: RunResult,

    pub stats: RunStatistics,

    #[serde(default)]
    pub artifacts: Vec<ArtifactReport>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            schema: crate::schema::MENDLOOP_RUN_V1.to_string(),
            run_id: Uuid::new_v4(),
            target: None,
            started_at,
            ended_at: None,
            result: RunResult::Success,
            stats: RunStatistics::default(),
            artifacts: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_report_carries_schema_and_empty_stats() {
        let report = RunReport::new(Utc::now());
        assert_eq!(report.schema, "mendloop.run.v1");
        assert_eq!(report.stats, RunStatistics::default());
        assert!(report.artifacts.is_empty());
    }

    #[test]
    fn optional_fields_are_omitted() {
        let report = RunReport::new(Utc::now());
        let v = serde_json::to_value(&report).expect("serialize");
        assert!(v.get("target").is_none());
        assert!(v.get("ended_at").is_none());
        assert_eq!(v["result"], "success");
    }
}
