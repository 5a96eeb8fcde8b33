//! Workflow results.

use std::time::Duration;

use serde_json::{json, Value};

use crate::steps::{StepError, StepResult};

/// Result of executing a workflow.
#[derive(Debug, Clone)]
pub struct WorkflowResult {
    /// Whether every step that ran succeeded.
    pub success: bool,
    /// One entry per step that actually ran, in execution order.
    pub results: Vec<StepResult>,
    /// The first failure, if any.
    pub error: Option<StepError>,
    /// Total duration.
    pub duration: Duration,
}

impl WorkflowResult {
    /// Output of the last step that ran.
    pub fn data(&self) -> Option<&Value> {
        self.results.last().and_then(|r| r.data.as_ref())
    }

    /// Results of the steps that failed.
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// JSON form used in machine-readable output.
    pub fn to_json(&self) -> Value {
        json!({
            "success": self.success,
            "data": self.data(),
            "error": self.error.as_ref().map(StepError::to_json),
            "duration_ms": self.duration.as_millis() as u64,
            "results": self.results.iter().map(StepResult::to_json).collect::<Vec<_>>(),
        })
    }
}
