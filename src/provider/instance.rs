//! Provider-agnostic step and workflow shapes.
//!
//! Configs are what callers hand to a [`Provider`](super::Provider);
//! instances are the built, read-only result.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{EntityKind, Result, StepwiseError, ValidationStage};
use crate::steps::{ExecutionContext, FnHandler, JsonSchema, ShapeValidator, Step, StepHandler};
use crate::workflow::Workflow;

/// Definition of a step before a provider builds it.
#[derive(Clone)]
pub struct StepConfig {
    pub id: String,
    pub description: Option<String>,
    pub input_schema: Option<Value>,
    pub output_schema: Option<Value>,
    pub handler: Arc<dyn StepHandler>,
}

impl StepConfig {
    pub fn new(id: impl Into<String>, handler: impl StepHandler + 'static) -> Self {
        Self {
            id: id.into(),
            description: None,
            input_schema: None,
            output_schema: None,
            handler: Arc::new(handler),
        }
    }

    /// Define a step from an async closure.
    pub fn from_fn<F, Fut>(id: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value, ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self::new(id, FnHandler::new(f))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }
}

impl fmt::Debug for StepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepConfig")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .field("output_schema", &self.output_schema)
            .finish_non_exhaustive()
    }
}

/// A built step. Read-only.
#[derive(Debug, Clone)]
pub struct StepInstance {
    id: String,
    description: Option<String>,
    input_schema: Option<Value>,
    output_schema: Option<Value>,
    step: Arc<Step>,
}

impl StepInstance {
    /// Build a step instance, compiling its schemas.
    pub fn from_config(config: StepConfig) -> Result<Self> {
        let mut step = Step::from_handler(config.id.clone(), config.handler);
        if let Some(description) = &config.description {
            step = step.with_description(description.clone());
        }
        if let Some(schema) = &config.input_schema {
            step = step.with_input_schema(schema.clone())?;
        }
        if let Some(schema) = &config.output_schema {
            step = step.with_output_schema(schema.clone())?;
        }

        Ok(Self {
            id: config.id,
            description: config.description,
            input_schema: config.input_schema,
            output_schema: config.output_schema,
            step: Arc::new(step),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn input_schema(&self) -> Option<&Value> {
        self.input_schema.as_ref()
    }

    pub fn output_schema(&self) -> Option<&Value> {
        self.output_schema.as_ref()
    }

    /// The validated, fault-capturing step this instance runs.
    pub fn step(&self) -> &Arc<Step> {
        &self.step
    }
}

/// Definition of a workflow before a provider builds it.
#[derive(Clone, Default)]
pub struct WorkflowConfig {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub steps: Vec<StepInstance>,
    pub input_schema: Option<Value>,
    pub output_schema: Option<Value>,
    pub continue_on_error: bool,
    /// Replaces the default step-by-step execution when set.
    pub execute: Option<Arc<dyn StepHandler>>,
}

impl WorkflowConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_step(mut self, step: StepInstance) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    /// Run this closure instead of the steps.
    pub fn with_execute<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value, ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.execute = Some(Arc::new(FnHandler::new(f)));
        self
    }
}

impl fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("steps", &self.steps)
            .field("input_schema", &self.input_schema)
            .field("output_schema", &self.output_schema)
            .field("continue_on_error", &self.continue_on_error)
            .field("execute", &self.execute.is_some())
            .finish()
    }
}

/// How an instance produces its output.
#[derive(Debug, Clone)]
pub(crate) enum InstanceBody {
    /// Run the steps in order, piping output to input.
    Steps(Workflow),
    /// Run a single caller-supplied handler.
    Custom(Step),
}

/// A built workflow. Read-only once built; registries share it as
/// `Arc<WorkflowInstance>`.
#[derive(Debug, Clone)]
pub struct WorkflowInstance {
    id: String,
    name: Option<String>,
    description: Option<String>,
    steps: Vec<StepInstance>,
    input_schema: Option<Arc<JsonSchema>>,
    output_schema: Option<Arc<JsonSchema>>,
    continue_on_error: bool,
    body: InstanceBody,
}

impl WorkflowInstance {
    /// Build a workflow instance, compiling its schemas.
    pub fn from_config(config: WorkflowConfig) -> Result<Self> {
        let compile = |schema: Option<Value>| -> Result<Option<Arc<JsonSchema>>> {
            schema
                .map(|s| {
                    JsonSchema::compile(s)
                        .map(Arc::new)
                        .map_err(|message| StepwiseError::InvalidSchema {
                            entity: EntityKind::Workflow,
                            id: config.id.clone(),
                            message,
                        })
                })
                .transpose()
        };
        let input_schema = compile(config.input_schema.clone())?;
        let output_schema = compile(config.output_schema.clone())?;

        let label = config.name.clone().unwrap_or_else(|| config.id.clone());
        let body = match &config.execute {
            Some(handler) => InstanceBody::Custom(Step::from_handler(label, handler.clone())),
            None => InstanceBody::Steps(
                config
                    .steps
                    .iter()
                    .fold(Workflow::new(label), |wf, s| {
                        wf.add_named_step(s.step().clone(), s.id())
                    })
                    .continue_on_error(config.continue_on_error),
            ),
        };

        Ok(Self {
            id: config.id,
            name: config.name,
            description: config.description,
            steps: config.steps,
            input_schema,
            output_schema,
            continue_on_error: config.continue_on_error,
            body,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name if set, otherwise id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn steps(&self) -> &[StepInstance] {
        &self.steps
    }

    pub fn continues_on_error(&self) -> bool {
        self.continue_on_error
    }

    /// Whether a custom execute handler replaces the steps.
    pub fn has_custom_execute(&self) -> bool {
        matches!(self.body, InstanceBody::Custom(_))
    }

    pub fn input_schema(&self) -> Option<&Value> {
        self.input_schema.as_deref().map(JsonSchema::source)
    }

    pub fn output_schema(&self) -> Option<&Value> {
        self.output_schema.as_deref().map(JsonSchema::source)
    }

    /// Check a value against the input schema, if any.
    pub fn check_input(&self, value: &Value) -> Result<()> {
        self.check(ValidationStage::Input, self.input_schema.as_deref(), value)
    }

    /// Check a value against the output schema, if any.
    pub fn check_output(&self, value: &Value) -> Result<()> {
        self.check(ValidationStage::Output, self.output_schema.as_deref(), value)
    }

    fn check(
        &self,
        stage: ValidationStage,
        schema: Option<&JsonSchema>,
        value: &Value,
    ) -> Result<()> {
        match schema {
            Some(schema) => {
                schema
                    .validate(value)
                    .map_err(|message| StepwiseError::SchemaValidation {
                        stage,
                        entity: EntityKind::Workflow,
                        id: self.id.clone(),
                        message,
                    })
            }
            None => Ok(()),
        }
    }

    pub(crate) fn body(&self) -> &InstanceBody {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(id: &str) -> StepInstance {
        StepInstance::from_config(StepConfig::from_fn(id, |input, _ctx| async move { Ok(input) }))
            .unwrap()
    }

    #[test]
    fn step_instance_keeps_schemas() {
        let instance = StepInstance::from_config(
            StepConfig::from_fn("check", |input, _ctx| async move { Ok(input) })
                .with_description("Checks things")
                .with_input_schema(json!({"type": "object"})),
        )
        .unwrap();

        assert_eq!(instance.id(), "check");
        assert_eq!(instance.description(), Some("Checks things"));
        assert_eq!(instance.input_schema(), Some(&json!({"type": "object"})));
        assert!(instance.output_schema().is_none());
        assert_eq!(instance.step().name(), "check");
    }

    #[test]
    fn step_instance_rejects_bad_schema() {
        let err = StepInstance::from_config(
            StepConfig::from_fn("bad", |input, _ctx| async move { Ok(input) })
                .with_output_schema(json!({"type": "nope"})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("step 'bad'"));
    }

    #[test]
    fn workflow_instance_rejects_bad_schema() {
        let err = WorkflowInstance::from_config(
            WorkflowConfig::new("broken").with_input_schema(json!({"minimum": "zero"})),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StepwiseError::InvalidSchema {
                entity: EntityKind::Workflow,
                ..
            }
        ));
    }

    #[test]
    fn workflow_instance_exposes_definition() {
        let instance = WorkflowInstance::from_config(
            WorkflowConfig::new("release")
                .with_name("Release")
                .with_step(echo("build"))
                .with_step(echo("publish"))
                .continue_on_error(true),
        )
        .unwrap();

        assert_eq!(instance.id(), "release");
        assert_eq!(instance.display_name(), "Release");
        let ids: Vec<_> = instance.steps().iter().map(StepInstance::id).collect();
        assert_eq!(ids, vec!["build", "publish"]);
        assert!(instance.continues_on_error());
        assert!(!instance.has_custom_execute());
    }

    #[test]
    fn check_input_reports_stage_entity_and_id() {
        let instance = WorkflowInstance::from_config(
            WorkflowConfig::new("numbers").with_input_schema(json!({"type": "number"})),
        )
        .unwrap();

        assert!(instance.check_input(&json!(4)).is_ok());
        assert!(instance.check_output(&json!("anything")).is_ok());

        let err = instance.check_input(&json!("four")).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Input validation failed for workflow 'numbers': "));
    }

    #[test]
    fn cloned_instance_shares_compiled_schemas() {
        let instance = WorkflowInstance::from_config(
            WorkflowConfig::new("numbers")
                .with_input_schema(json!({"type": "number"}))
                .with_output_schema(json!({"type": "string"})),
        )
        .unwrap();
        let copy = instance.clone();

        assert_eq!(copy.input_schema(), Some(&json!({"type": "number"})));
        assert!(copy.check_input(&json!(1)).is_ok());
        assert!(copy.check_input(&json!("one")).is_err());
        assert!(copy.check_output(&json!(2)).is_err());
    }
}
