//! Configuration validation rules.
//!
//! This module validates configuration for correctness:
//! - Workflows must have at least one step
//! - Step names must be unique within a workflow
//! - Step types must be registered
//! - Schemas must compile
//! - `${...}` references must use a known namespace

use crate::actions::StepRegistry;
use crate::config::interpolation::{extract_variables, is_known_variable};
use crate::config::schema::StepwiseConfig;
use crate::error::{Result, StepwiseError};
use crate::steps::JsonSchema;
use serde_json::Value;
use std::collections::HashSet;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Workflow the error belongs to
    pub workflow: String,
    /// Step name if error is step-specific
    pub step: Option<String>,
}

impl ValidationError {
    fn new(rule: &str, workflow: &str, step: Option<&str>, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            workflow: workflow.to_string(),
            step: step.map(str::to_string),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// Collects every error rather than stopping at the first one, so several
/// issues can be fixed at once. Errors are ordered by workflow id.
pub fn validate_config(config: &StepwiseConfig, registry: &StepRegistry) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for id in config.workflow_ids() {
        let workflow = &config.workflows[id];

        if workflow.steps.is_empty() {
            errors.push(ValidationError::new(
                "empty-workflow",
                id,
                None,
                format!("Workflow '{}' has no steps", id),
            ));
        }

        check_schema(&mut errors, id, None, "input_schema", &workflow.input_schema);
        check_schema(&mut errors, id, None, "output_schema", &workflow.output_schema);

        let mut seen = HashSet::new();
        for step in &workflow.steps {
            let name = step.name.as_str();

            if name.trim().is_empty() {
                errors.push(ValidationError::new(
                    "missing-step-name",
                    id,
                    None,
                    format!("Workflow '{}' has a step without a name", id),
                ));
            } else if !seen.insert(name) {
                errors.push(ValidationError::new(
                    "duplicate-step",
                    id,
                    Some(name),
                    format!("Workflow '{}' has more than one step named '{}'", id, name),
                ));
            }

            if !registry.contains(&step.step_type) {
                errors.push(ValidationError::new(
                    "unknown-step-type",
                    id,
                    Some(name),
                    format!(
                        "Step '{}' in workflow '{}' has unknown type '{}'",
                        name, id, step.step_type
                    ),
                ));
            }

            check_schema(&mut errors, id, Some(name), "input_schema", &step.input_schema);
            check_schema(&mut errors, id, Some(name), "output_schema", &step.output_schema);

            let mut unknown: Vec<_> = variables_in(&step.params)
                .into_iter()
                .filter(|var| !is_known_variable(var))
                .collect();
            unknown.sort();
            for var in unknown {
                errors.push(ValidationError::new(
                    "unknown-variable",
                    id,
                    Some(name),
                    format!(
                        "Step '{}' in workflow '{}' references unknown variable '${{{}}}'",
                        name, id, var
                    ),
                ));
            }
        }
    }

    errors
}

fn check_schema(
    errors: &mut Vec<ValidationError>,
    workflow: &str,
    step: Option<&str>,
    field: &str,
    schema: &Option<Value>,
) {
    let Some(schema) = schema else {
        return;
    };
    if let Err(message) = JsonSchema::compile(schema.clone()) {
        let owner = match step {
            Some(step) => format!("Step '{}' in workflow '{}'", step, workflow),
            None => format!("Workflow '{}'", workflow),
        };
        errors.push(ValidationError::new(
            "invalid-schema",
            workflow,
            step,
            format!("{} has an invalid {}: {}", owner, field, message),
        ));
    }
}

fn variables_in(value: &Value) -> HashSet<String> {
    match value {
        Value::String(s) => extract_variables(s),
        Value::Array(items) => items.iter().flat_map(variables_in).collect(),
        Value::Object(map) => map.values().flat_map(variables_in).collect(),
        _ => HashSet::new(),
    }
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &StepwiseConfig, registry: &StepRegistry) -> Result<()> {
    let errors = validate_config(config, registry);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(StepwiseError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}
