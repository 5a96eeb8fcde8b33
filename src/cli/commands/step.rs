//! Step command implementation.
//!
//! The `stepwise step` command runs a single step of a registered type,
//! outside of any workflow. No configuration file is needed.

use async_trait::async_trait;
use serde_json::Value;

use crate::actions::{StepRegistry, WorkingDir};
use crate::cli::args::StepArgs;
use crate::error::{Result, StepwiseError};
use crate::steps::ExecutionContext;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult};
use super::display::print_json;
use super::input::read_input;

/// The step command implementation.
pub struct StepCommand {
    context: CommandContext,
    args: StepArgs,
    registry: StepRegistry,
}

impl StepCommand {
    /// Create a new step command using the built-in step types.
    pub fn new(context: CommandContext, args: StepArgs) -> Self {
        Self::with_registry(context, args, StepRegistry::builtin())
    }

    /// Create a new step command with a custom registry.
    pub fn with_registry(context: CommandContext, args: StepArgs, registry: StepRegistry) -> Self {
        Self {
            context,
            args,
            registry,
        }
    }

    fn params(&self) -> Result<Value> {
        match &self.args.params {
            Some(text) => serde_json::from_str(text).map_err(|e| {
                StepwiseError::ConfigValidationError {
                    message: format!("--params is not valid JSON: {}", e),
                }
            }),
            None => Ok(Value::Null),
        }
    }
}

#[async_trait(?Send)]
impl Command for StepCommand {
    async fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let params = self.params()?;
        let step = self
            .registry
            .create(&self.args.step_type, &self.args.step_type, &params)?;
        let input = read_input(&self.args.input)?.unwrap_or(Value::Null);

        let ctx = ExecutionContext::new().attach(WorkingDir(self.context.project_root.clone()));
        let result = step.execute(input, &ctx).await;

        if self.context.json {
            print_json(ui, &result.to_json());
        } else {
            ui.show_step(&result);
            if let Some(data) = &result.data {
                ui.print_raw(&serde_json::to_string_pretty(data)?);
            }
        }

        Ok(CommandResult::from_success(result.success))
    }
}
