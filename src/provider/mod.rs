//! Pluggable execution backends.
//!
//! A [`Provider`] builds steps and workflows and executes workflow
//! instances. [`LocalProvider`] runs everything in-process and is the
//! default; [`WorkflowFacade`] keeps a registry of built instances in front
//! of whichever provider is active.

pub mod facade;
pub mod instance;
pub mod local;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::steps::{ExecutionContext, StepError, StepResult};
use crate::workflow::WorkflowResult;

pub use facade::{WorkflowFacade, WorkflowRef};
pub use instance::{StepConfig, StepInstance, WorkflowConfig, WorkflowInstance};
pub use local::LocalProvider;

/// An execution backend.
///
/// Failures inside a workflow come back as a failed [`ExecutionResult`];
/// `Err` is reserved for problems with the request itself.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn create_step(&self, config: StepConfig) -> Result<StepInstance>;

    fn create_workflow(&self, config: WorkflowConfig) -> Result<WorkflowInstance>;

    async fn execute(
        &self,
        workflow: &WorkflowInstance,
        input: Value,
        ctx: Option<ExecutionContext>,
    ) -> Result<ExecutionResult>;
}

/// Outcome of a provider execution.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<StepError>,
    pub duration: Duration,
    /// Per-step results, empty when a custom execute handler ran.
    pub steps: Vec<StepResult>,
}

impl ExecutionResult {
    /// A failure that happened before or after the steps ran.
    pub fn failure(error: StepError, duration: Duration, steps: Vec<StepResult>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            duration,
            steps,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "success": self.success,
            "data": self.data,
            "error": self.error.as_ref().map(StepError::to_json),
            "duration_ms": self.duration.as_millis() as u64,
            "steps": self.steps.iter().map(StepResult::to_json).collect::<Vec<_>>(),
        })
    }
}

impl From<WorkflowResult> for ExecutionResult {
    fn from(result: WorkflowResult) -> Self {
        Self {
            success: result.success,
            data: result.data().cloned(),
            error: result.error,
            duration: result.duration,
            steps: result.results,
        }
    }
}

impl From<StepResult> for ExecutionResult {
    fn from(result: StepResult) -> Self {
        Self {
            success: result.success,
            data: result.data,
            error: result.error,
            duration: result.duration,
            steps: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_workflow_result_takes_last_data() {
        let workflow = WorkflowResult {
            success: true,
            results: vec![
                StepResult::success("a", json!(1), Duration::ZERO),
                StepResult::success("b", json!(2), Duration::ZERO),
            ],
            error: None,
            duration: Duration::from_millis(1),
        };

        let result = ExecutionResult::from(workflow);
        assert!(result.success);
        assert_eq!(result.data, Some(json!(2)));
        assert_eq!(result.steps.len(), 2);
    }

    #[test]
    fn failure_has_no_data() {
        let result = ExecutionResult::failure(StepError::execution("nope"), Duration::ZERO, vec![]);
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.to_json()["error"]["message"], json!("nope"));
    }
}
