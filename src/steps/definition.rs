//! The step wrapper: validation, timing, logging, and fault capture
//! around a unit of work.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, Instrument};

use super::context::ExecutionContext;
use super::result::{StepError, StepResult};
use super::validator::{JsonSchema, ShapeValidator};
use crate::error::{EntityKind, Result, StepwiseError, ValidationStage};

/// The work a step performs.
#[async_trait]
pub trait StepHandler: Send + Sync {
    async fn run(&self, input: Value, ctx: &ExecutionContext) -> anyhow::Result<Value>;
}

/// Handler backed by an async closure.
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> StepHandler for FnHandler<F>
where
    F: Fn(Value, ExecutionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    async fn run(&self, input: Value, ctx: &ExecutionContext) -> anyhow::Result<Value> {
        (self.f)(input, ctx.clone()).await
    }
}

/// Marks a handler error raised because the input could not be
/// deserialized into the handler's input type.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct InputShapeError(String);

/// Handler with serde-typed input and output.
struct TypedHandler<In, Out, F> {
    f: F,
    _types: PhantomData<fn(In) -> Out>,
}

#[async_trait]
impl<In, Out, F, Fut> StepHandler for TypedHandler<In, Out, F>
where
    In: DeserializeOwned + Send + 'static,
    Out: Serialize + Send + 'static,
    F: Fn(In, ExecutionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Out>> + Send + 'static,
{
    async fn run(&self, input: Value, ctx: &ExecutionContext) -> anyhow::Result<Value> {
        let typed: In =
            serde_json::from_value(input).map_err(|e| InputShapeError(e.to_string()))?;
        let output = (self.f)(typed, ctx.clone()).await?;
        Ok(serde_json::to_value(output)?)
    }
}

/// A named unit of work with optional input and output validation.
///
/// Steps are immutable once built and cheap to clone; the same step may be
/// added to several workflows under different labels.
#[derive(Clone)]
pub struct Step {
    name: String,
    description: Option<String>,
    input_validator: Option<Arc<dyn ShapeValidator>>,
    output_validator: Option<Arc<dyn ShapeValidator>>,
    handler: Arc<dyn StepHandler>,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_validator", &self.input_validator)
            .field("output_validator", &self.output_validator)
            .finish_non_exhaustive()
    }
}

impl Step {
    /// Create a step from a handler.
    pub fn new(name: impl Into<String>, handler: impl StepHandler + 'static) -> Self {
        Self::from_handler(name, Arc::new(handler))
    }

    /// Create a step from a shared handler.
    pub fn from_handler(name: impl Into<String>, handler: Arc<dyn StepHandler>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_validator: None,
            output_validator: None,
            handler,
        }
    }

    /// Create a step from an async closure over JSON values.
    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value, ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self::new(name, FnHandler::new(f))
    }

    /// Create a step from an async closure over serde types.
    ///
    /// Input that does not deserialize into `In` fails the step as an input
    /// validation failure without calling the closure.
    pub fn typed<In, Out, F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        In: DeserializeOwned + Send + 'static,
        Out: Serialize + Send + 'static,
        F: Fn(In, ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Out>> + Send + 'static,
    {
        Self::new(
            name,
            TypedHandler {
                f,
                _types: PhantomData,
            },
        )
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_input_validator(mut self, validator: impl ShapeValidator + 'static) -> Self {
        self.input_validator = Some(Arc::new(validator));
        self
    }

    pub fn with_output_validator(mut self, validator: impl ShapeValidator + 'static) -> Self {
        self.output_validator = Some(Arc::new(validator));
        self
    }

    /// Validate input against a JSON Schema document.
    pub fn with_input_schema(self, schema: Value) -> Result<Self> {
        let validator = self.compile_schema(schema)?;
        Ok(self.with_input_validator(validator))
    }

    /// Validate output against a JSON Schema document.
    pub fn with_output_schema(self, schema: Value) -> Result<Self> {
        let validator = self.compile_schema(schema)?;
        Ok(self.with_output_validator(validator))
    }

    fn compile_schema(&self, schema: Value) -> Result<JsonSchema> {
        JsonSchema::compile(schema).map_err(|message| StepwiseError::InvalidSchema {
            entity: EntityKind::Step,
            id: self.name.clone(),
            message,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The handler without this step's validation.
    pub fn handler(&self) -> &Arc<dyn StepHandler> {
        &self.handler
    }

    /// Execute the step.
    ///
    /// Never fails and never unwinds: validation failures, handler errors,
    /// and handler panics all come back as a failed [`StepResult`].
    pub async fn execute(&self, input: Value, ctx: &ExecutionContext) -> StepResult {
        self.execute_labeled(&self.name, input, ctx).await
    }

    /// Execute under a workflow label, which names the result and log events.
    pub(crate) async fn execute_labeled(
        &self,
        label: &str,
        input: Value,
        ctx: &ExecutionContext,
    ) -> StepResult {
        let span = tracing::info_span!(parent: ctx.span(), "step", step = %label);

        async move {
            info!(step = %label, "Starting step");
            debug!(step = %label, input = %input, "Step input");

            let start = Instant::now();
            let outcome = AssertUnwindSafe(self.run_checked(label, input, ctx))
                .catch_unwind()
                .await;
            let duration = start.elapsed();

            let mut result = match outcome {
                Ok(Ok(data)) => StepResult::success(label, data, duration),
                Ok(Err(err)) => StepResult::failure(label, err, duration),
                Err(payload) => StepResult::failure(
                    label,
                    StepError::panic(panic_message(payload.as_ref())),
                    duration,
                ),
            };
            if label != self.name {
                result = result.with_metadata("step", Value::String(self.name.clone()));
            }

            match &result.error {
                None => info!(
                    step = %label,
                    duration_ms = duration.as_millis() as u64,
                    success = true,
                    "Step completed"
                ),
                Some(err) => error!(
                    step = %label,
                    duration_ms = duration.as_millis() as u64,
                    success = false,
                    kind = %err.kind,
                    error = %err.message,
                    "Step failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn run_checked(
        &self,
        label: &str,
        input: Value,
        ctx: &ExecutionContext,
    ) -> std::result::Result<Value, StepError> {
        if let Some(validator) = &self.input_validator {
            validator
                .validate(&input)
                .map_err(|message| validation_error(ValidationStage::Input, label, message))?;
        }

        let data = self.handler.run(input, ctx).await.map_err(|err| {
            match err.downcast_ref::<InputShapeError>() {
                Some(shape) => validation_error(ValidationStage::Input, label, shape.0.clone()),
                None => StepError::execution(format!("{:#}", err)),
            }
        })?;

        if let Some(validator) = &self.output_validator {
            if !data.is_null() {
                validator
                    .validate(&data)
                    .map_err(|message| validation_error(ValidationStage::Output, label, message))?;
            }
        }

        Ok(data)
    }
}

fn validation_error(stage: ValidationStage, id: &str, message: String) -> StepError {
    let full = StepwiseError::SchemaValidation {
        stage,
        entity: EntityKind::Step,
        id: id.to_string(),
        message,
    };
    StepError::validation(stage, full.to_string())
}

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("step panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("step panicked: {}", s)
    } else {
        "step panicked".to_string()
    }
}
