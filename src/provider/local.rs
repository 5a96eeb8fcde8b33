//! In-process provider.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info};

use super::instance::InstanceBody;
use super::{ExecutionResult, Provider, StepConfig, StepInstance, WorkflowConfig, WorkflowInstance};
use crate::error::{Result, ValidationStage};
use crate::steps::{ExecutionContext, StepError};

/// Runs workflow instances in the current process.
///
/// Workflow input is checked before anything runs and output after the
/// last step; steps run in order with each output piped to the next input.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProvider;

impl LocalProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Provider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn create_step(&self, config: StepConfig) -> Result<StepInstance> {
        debug!(step = %config.id, "Creating step instance");
        StepInstance::from_config(config)
    }

    fn create_workflow(&self, config: WorkflowConfig) -> Result<WorkflowInstance> {
        debug!(workflow = %config.id, steps = config.steps.len(), "Creating workflow instance");
        WorkflowInstance::from_config(config)
    }

    async fn execute(
        &self,
        workflow: &WorkflowInstance,
        input: Value,
        ctx: Option<ExecutionContext>,
    ) -> Result<ExecutionResult> {
        let ctx = ctx.unwrap_or_default();
        let start = Instant::now();
        info!(provider = self.name(), workflow = %workflow.id(), "Executing workflow instance");

        if let Err(err) = workflow.check_input(&input) {
            error!(workflow = %workflow.id(), error = %err, "Workflow input rejected");
            return Ok(ExecutionResult::failure(
                StepError::validation(ValidationStage::Input, err.to_string()),
                start.elapsed(),
                Vec::new(),
            ));
        }

        let mut result: ExecutionResult = match workflow.body() {
            InstanceBody::Steps(steps) => steps.execute_in(input, &ctx, |_| {}).await.into(),
            InstanceBody::Custom(handler) => {
                let scoped = ctx.child(workflow.display_name());
                handler.execute(input, &scoped).await.into()
            }
        };

        if result.success {
            if let Some(data) = &result.data {
                if let Err(err) = workflow.check_output(data) {
                    error!(workflow = %workflow.id(), error = %err, "Workflow output rejected");
                    result.success = false;
                    result.data = None;
                    result.error = Some(StepError::validation(
                        ValidationStage::Output,
                        err.to_string(),
                    ));
                }
            }
        }

        result.duration = start.elapsed();
        Ok(result)
    }
}
