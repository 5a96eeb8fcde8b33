//! Ordered step pipelines.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{error, info, warn, Instrument};

use super::result::WorkflowResult;
use crate::steps::{ExecutionContext, Metadata, Step, StepResult};

/// Progress events emitted during workflow execution.
#[derive(Debug)]
pub enum WorkflowProgress<'a> {
    /// A step is about to start.
    StepStarting {
        name: &'a str,
        index: usize,
        total: usize,
    },
    /// A step finished.
    StepFinished {
        name: &'a str,
        result: &'a StepResult,
    },
}

/// A step as placed in a workflow, under its label.
#[derive(Debug, Clone)]
pub struct WorkflowStep {
    /// Label within this workflow (defaults to the step's name).
    pub label: String,
    /// The step.
    pub step: Arc<Step>,
}

/// An ordered, flat sequence of steps with a shared halt/continue policy.
///
/// Steps are only ever appended. Each call to [`execute`](Self::execute) is
/// an independent run: output of step N is the input of step N+1, and a
/// failed step passes `null` along when `continue_on_error` is set.
#[derive(Debug, Clone)]
pub struct Workflow {
    name: String,
    description: Option<String>,
    steps: Vec<WorkflowStep>,
    continue_on_error: bool,
}

impl Workflow {
    /// Create an empty workflow that halts on the first failure.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            steps: Vec::new(),
            continue_on_error: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a step labelled with its own name.
    pub fn add_step(self, step: impl Into<Arc<Step>>) -> Self {
        let step = step.into();
        let label = step.name().to_string();
        self.push(label, step)
    }

    /// Append a step under a label that may differ from the step's name.
    pub fn add_named_step(self, step: impl Into<Arc<Step>>, label: impl Into<String>) -> Self {
        self.push(label.into(), step.into())
    }

    fn push(mut self, label: String, step: Arc<Step>) -> Self {
        self.steps.push(WorkflowStep { label, step });
        self
    }

    /// Keep running remaining steps after a failure.
    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn continues_on_error(&self) -> bool {
        self.continue_on_error
    }

    /// Execute the workflow with optional caller metadata.
    pub async fn execute(&self, input: Value, metadata: Option<Metadata>) -> WorkflowResult {
        let ctx = ExecutionContext::with_metadata(metadata.unwrap_or_default());
        self.execute_in(input, &ctx, |_| {}).await
    }

    /// Execute within a caller context, reporting progress as steps run.
    ///
    /// All steps share one context scoped to a child span named after the
    /// workflow.
    pub async fn execute_in<F>(
        &self,
        input: Value,
        parent: &ExecutionContext,
        mut on_progress: F,
    ) -> WorkflowResult
    where
        F: FnMut(WorkflowProgress<'_>) + Send,
    {
        let ctx = parent.child(&self.name);
        let span = ctx.span().clone();

        async move {
            let total = self.steps.len();
            info!(workflow = %self.name, steps = total, "Starting workflow");

            let start = Instant::now();
            let mut results: Vec<StepResult> = Vec::with_capacity(total);
            let mut current = input;

            for (index, entry) in self.steps.iter().enumerate() {
                on_progress(WorkflowProgress::StepStarting {
                    name: &entry.label,
                    index,
                    total,
                });

                let result = entry.step.execute_labeled(&entry.label, current, &ctx).await;
                current = result.data_or_null();

                on_progress(WorkflowProgress::StepFinished {
                    name: &entry.label,
                    result: &result,
                });

                let halted = !result.success && !self.continue_on_error;
                results.push(result);

                if halted {
                    let duration = start.elapsed();
                    let error = results.last().and_then(|r| r.error.clone());
                    error!(
                        workflow = %self.name,
                        step = %entry.label,
                        duration_ms = duration.as_millis() as u64,
                        "Workflow failed"
                    );
                    return WorkflowResult {
                        success: false,
                        results,
                        error,
                        duration,
                    };
                }
            }

            let duration = start.elapsed();
            let success = results.iter().all(|r| r.success);
            let error = results.iter().find_map(|r| r.error.clone());

            if success {
                info!(
                    workflow = %self.name,
                    duration_ms = duration.as_millis() as u64,
                    "Workflow completed"
                );
            } else {
                warn!(
                    workflow = %self.name,
                    failed = results.iter().filter(|r| !r.success).count(),
                    duration_ms = duration.as_millis() as u64,
                    "Workflow completed with failures"
                );
            }

            WorkflowResult {
                success,
                results,
                error,
                duration,
            }
        }
        .instrument(span)
        .await
    }
}
