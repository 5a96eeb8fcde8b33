//! List command implementation.
//!
//! The `stepwise list` command lists configured workflows and the step
//! types available to them.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::actions::StepRegistry;
use crate::cli::args::ListArgs;
use crate::config::StepwiseConfig;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult, EXIT_NO_CONFIG};
use super::display::print_json;
use super::input::load_project_config;

/// The list command implementation.
pub struct ListCommand {
    context: CommandContext,
    args: ListArgs,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(context: CommandContext, args: ListArgs) -> Self {
        Self { context, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ListArgs {
        &self.args
    }

    fn workflows_json(config: &StepwiseConfig) -> Value {
        let workflows: Vec<Value> = config
            .workflow_ids()
            .into_iter()
            .filter_map(|id| config.workflows.get(id).map(|wf| (id, wf)))
            .map(|(id, wf)| {
                let steps: Vec<Value> = wf
                    .steps
                    .iter()
                    .map(|s| json!({"name": s.name, "type": s.step_type}))
                    .collect();
                json!({
                    "id": id,
                    "description": wf.description,
                    "steps": steps,
                })
            })
            .collect();
        Value::Array(workflows)
    }

    fn types_json(registry: &StepRegistry) -> Value {
        registry
            .types()
            .into_iter()
            .map(|(name, description)| json!({"name": name, "description": description}))
            .collect()
    }

    fn show_workflows(ui: &mut dyn UserInterface, config: &StepwiseConfig) {
        let theme = ui.theme().clone();
        ui.message(&format!("  {}", theme.key.apply_to("Workflows:")));
        for id in config.workflow_ids() {
            let Some(workflow) = config.workflows.get(id) else {
                continue;
            };
            let names: Vec<&str> = workflow.steps.iter().map(|s| s.name.as_str()).collect();
            ui.message(&format!(
                "    {}{} {}",
                theme.highlight.apply_to(id),
                theme.dim.apply_to(":"),
                theme.dim.apply_to(names.join(" → ")),
            ));
            if let Some(desc) = &workflow.description {
                ui.message(&format!("      {}", theme.dim.apply_to(desc)));
            }
        }
    }

    fn show_types(ui: &mut dyn UserInterface, registry: &StepRegistry) {
        let theme = ui.theme().clone();
        ui.message(&format!("  {}", theme.key.apply_to("Step types:")));
        for (name, description) in registry.types() {
            ui.message(&format!(
                "    {} {}",
                theme.highlight.apply_to(format!("{:<16}", name)),
                theme.dim.apply_to(description)
            ));
        }
    }
}

#[async_trait(?Send)]
impl Command for ListCommand {
    async fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let registry = StepRegistry::builtin();

        let config = if self.args.types_only {
            None
        } else {
            match load_project_config(&self.context, ui)? {
                Some(config) => Some(config),
                None => return Ok(CommandResult::failure(EXIT_NO_CONFIG)),
            }
        };

        if self.context.json {
            let mut out = serde_json::Map::new();
            if let Some(config) = &config {
                out.insert("workflows".to_string(), Self::workflows_json(config));
            }
            if !self.args.workflows_only {
                out.insert("step_types".to_string(), Self::types_json(&registry));
            }
            print_json(ui, &Value::Object(out));
            return Ok(CommandResult::success());
        }

        if let Some(config) = &config {
            Self::show_workflows(ui, config);
            if !self.args.workflows_only {
                ui.message("");
            }
        }
        if !self.args.workflows_only {
            Self::show_types(ui, &registry);
        }

        Ok(CommandResult::success())
    }
}
