//! Turn a loaded configuration into a ready-to-run [`WorkflowRunner`].

use tracing::debug;

use crate::actions::StepRegistry;
use crate::config::schema::{StepDefinition, StepwiseConfig};
use crate::config::validator::validate;
use crate::error::Result;
use crate::provider::{StepConfig, StepInstance, WorkflowConfig, WorkflowFacade};
use crate::runner::WorkflowRunner;

/// Validate `config` and register every workflow it defines.
///
/// Workflows are built through the runner's facade, so workflow-level
/// schemas are checked by the provider on every run.
pub fn build_runner(config: &StepwiseConfig, registry: &StepRegistry) -> Result<WorkflowRunner> {
    let mut runner = WorkflowRunner::new();
    register_workflows(&mut runner, config, registry)?;
    Ok(runner)
}

/// Validate `config` and register its workflows on an existing runner.
pub fn register_workflows(
    runner: &mut WorkflowRunner,
    config: &StepwiseConfig,
    registry: &StepRegistry,
) -> Result<()> {
    validate(config, registry)?;

    for id in config.workflow_ids() {
        let definition = &config.workflows[id];

        let mut workflow = WorkflowConfig::new(id)
            .continue_on_error(config.continues_on_error(definition));
        if let Some(description) = &definition.description {
            workflow = workflow.with_description(description.clone());
        }
        if let Some(schema) = &definition.input_schema {
            workflow = workflow.with_input_schema(schema.clone());
        }
        if let Some(schema) = &definition.output_schema {
            workflow = workflow.with_output_schema(schema.clone());
        }
        for step in &definition.steps {
            workflow = workflow.with_step(build_step(runner.facade(), registry, step)?);
        }

        debug!(workflow = %id, steps = definition.steps.len(), "Built workflow from config");
        let instance = runner.facade_mut().create_workflow(workflow)?;
        runner.register_workflow(instance, Some(id));
    }

    Ok(())
}

fn build_step(
    facade: &WorkflowFacade,
    registry: &StepRegistry,
    definition: &StepDefinition,
) -> Result<StepInstance> {
    let step = registry.create(&definition.step_type, &definition.name, &definition.params)?;

    facade.create_step(StepConfig {
        id: definition.name.clone(),
        description: definition.description.clone(),
        input_schema: definition.input_schema.clone(),
        output_schema: definition.output_schema.clone(),
        handler: step.handler().clone(),
    })
}
