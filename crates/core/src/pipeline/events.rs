//! # Pipeline Events
//!
//! Progress notifications emitted by the executor. Events carry stage
//! names, timings and error messages; stage output text never leaves the
//! run through this channel.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineEventKind {
    PipelineStarted,
    StageStarted,
    StageCompleted,
    StageFailed,
    PipelineCompleted,
    PipelineFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// Identifies the run the event belongs to
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: PipelineEventKind,
    pub pipeline: String,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl PipelineEvent {
    pub fn new(kind: PipelineEventKind, run_id: &str, pipeline: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            timestamp: Utc::now(),
            kind,
            pipeline: pipeline.to_string(),
            stage: None,
            data: None,
        }
    }

    pub fn with_stage(mut self, stage: &str) -> Self {
        self.stage = Some(stage.to_string());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Process-unique run id: start time plus a sequence number
pub fn next_run_id() -> String {
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{:x}-{:04x}", Utc::now().timestamp_millis(), seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = PipelineEvent::new(PipelineEventKind::StageFailed, "r1", "blog")
            .with_stage("create_content")
            .with_data(serde_json::json!({"error": "timed out"}));
        assert_eq!(event.stage.as_deref(), Some("create_content"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "stage_failed");
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(next_run_id(), next_run_id());
    }
}
