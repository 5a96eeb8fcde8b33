//! Run requests and results.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::provider::ExecutionResult;
use crate::steps::{format_duration, Metadata, StepError, StepResult};
use crate::workflow::WorkflowResult;

/// One entry in a multi-workflow run.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Registered workflow id.
    pub workflow: String,
    /// Input; when absent in a sequential run the previous output is used.
    pub input: Option<Value>,
    pub metadata: Option<Metadata>,
}

impl RunConfig {
    pub fn new(workflow: impl Into<String>) -> Self {
        Self {
            workflow: workflow.into(),
            ..Default::default()
        }
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Result of running one registered workflow.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Registry key the workflow ran under.
    pub workflow: String,
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<StepError>,
    pub duration: Duration,
    /// Per-step results.
    pub steps: Vec<StepResult>,
    pub started_at: DateTime<Utc>,
}

impl RunResult {
    pub(crate) fn from_workflow(
        workflow: &str,
        started_at: DateTime<Utc>,
        result: WorkflowResult,
    ) -> Self {
        Self::from_execution(workflow, started_at, result.into())
    }

    pub(crate) fn from_execution(
        workflow: &str,
        started_at: DateTime<Utc>,
        result: ExecutionResult,
    ) -> Self {
        Self {
            workflow: workflow.to_string(),
            success: result.success,
            data: result.data,
            error: result.error,
            duration: result.duration,
            steps: result.steps,
            started_at,
        }
    }

    /// Generate a summary line for display.
    pub fn summary_line(&self) -> String {
        if self.success {
            format!(
                "✓ {} completed in {}",
                self.workflow,
                format_duration(self.duration)
            )
        } else {
            let error = self
                .error
                .as_ref()
                .map(|e| e.message.as_str())
                .unwrap_or("unknown error");
            format!(
                "✗ {} failed after {}: {}",
                self.workflow,
                format_duration(self.duration),
                error
            )
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "workflow": self.workflow,
            "success": self.success,
            "data": self.data,
            "error": self.error.as_ref().map(StepError::to_json),
            "duration_ms": self.duration.as_millis() as u64,
            "started_at": self.started_at.to_rfc3339(),
            "steps": self.steps.iter().map(StepResult::to_json).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_config_builder() {
        let mut metadata = Metadata::new();
        metadata.insert("k".into(), json!("v"));
        let config = RunConfig::new("deploy")
            .with_input(json!({"value": 1}))
            .with_metadata(metadata);

        assert_eq!(config.workflow, "deploy");
        assert_eq!(config.input, Some(json!({"value": 1})));
        assert_eq!(config.metadata.unwrap()["k"], json!("v"));
    }

    #[test]
    fn summary_line_reports_failure_message() {
        let result = RunResult::from_execution(
            "deploy",
            Utc::now(),
            ExecutionResult::failure(StepError::execution("Failed"), Duration::ZERO, vec![]),
        );
        let line = result.summary_line();
        assert!(line.starts_with("✗ deploy failed"));
        assert!(line.ends_with("Failed"));
    }

    #[test]
    fn to_json_has_cli_fields() {
        let workflow = WorkflowResult {
            success: true,
            results: vec![StepResult::success("a", json!(2), Duration::ZERO)],
            error: None,
            duration: Duration::from_millis(12),
        };
        let value = RunResult::from_workflow("count", Utc::now(), workflow).to_json();

        assert_eq!(value["workflow"], json!("count"));
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"], json!(2));
        assert_eq!(value["duration_ms"], json!(12));
        assert!(value["started_at"].is_string());
    }
}
