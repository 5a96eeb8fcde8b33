//! Workflow registration and orchestration.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde_json::Value;
use tracing::{error, info, warn};

use super::identity::{RegisteredWorkflow, WorkflowIdentity};
use super::result::{RunConfig, RunResult};
use crate::error::{Result, StepwiseError};
use crate::provider::{Provider, WorkflowFacade, WorkflowRef};
use crate::steps::{Attachments, ExecutionContext, Metadata};

#[derive(Debug)]
struct Entry {
    identity: WorkflowIdentity,
    workflow: RegisteredWorkflow,
}

/// Registers workflows and runs them singly, in sequence, or in parallel.
///
/// Local workflows run directly; provider instances run through the
/// facade. The registry belongs to this runner alone.
#[derive(Debug, Default)]
pub struct WorkflowRunner {
    workflows: HashMap<String, Entry>,
    facade: WorkflowFacade,
    attachments: Attachments,
}

impl WorkflowRunner {
    /// Create a runner backed by the in-process provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner that executes provider instances through `provider`.
    pub fn with_provider(provider: Arc<dyn Provider>) -> Self {
        Self::with_facade(WorkflowFacade::new(provider))
    }

    pub fn with_facade(facade: WorkflowFacade) -> Self {
        Self {
            workflows: HashMap::new(),
            facade,
            attachments: Attachments::new(),
        }
    }

    pub fn facade(&self) -> &WorkflowFacade {
        &self.facade
    }

    pub fn facade_mut(&mut self) -> &mut WorkflowFacade {
        &mut self.facade
    }

    /// Attach a typed value to every execution context this runner builds.
    pub fn attach<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.attachments.insert(value);
        self
    }

    /// Register a workflow, optionally under an explicit id.
    ///
    /// Re-registering a key replaces the previous workflow.
    pub fn register_workflow(
        &mut self,
        workflow: impl Into<RegisteredWorkflow>,
        id: Option<&str>,
    ) -> &mut Self {
        let workflow = workflow.into();
        let identity = WorkflowIdentity::resolve(id, &workflow);
        let key = identity.key().to_string();

        if matches!(identity, WorkflowIdentity::Anonymous) {
            warn!("Registering workflow without an id as '{}'", key);
        }
        info!(workflow = %key, kind = workflow.kind(), "Registered workflow");

        if self.workflows.insert(key.clone(), Entry { identity, workflow }).is_some() {
            warn!(workflow = %key, "Replaced previously registered workflow");
        }
        self
    }

    /// Registered workflow ids, sorted.
    pub fn workflows(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.workflows.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn has_workflow(&self, id: &str) -> bool {
        self.workflows.contains_key(id)
    }

    pub fn get_workflow(&self, id: &str) -> Option<&RegisteredWorkflow> {
        self.workflows.get(id).map(|e| &e.workflow)
    }

    pub fn identity(&self, id: &str) -> Option<&WorkflowIdentity> {
        self.workflows.get(id).map(|e| &e.identity)
    }

    fn lookup(&self, id: &str) -> Result<&Entry> {
        self.workflows.get(id).ok_or_else(|| {
            let err = StepwiseError::WorkflowNotFound { id: id.to_string() };
            error!(workflow = %id, "{}", err);
            err
        })
    }

    /// Run one workflow by id.
    ///
    /// Fails only when nothing is registered under `id`; failures while the
    /// workflow runs are reported in the [`RunResult`].
    pub async fn run_workflow(
        &self,
        id: &str,
        input: Value,
        metadata: Option<Metadata>,
    ) -> Result<RunResult> {
        let entry = self.lookup(id)?;
        self.run_entry(id, entry, input, metadata).await
    }

    async fn run_entry(
        &self,
        id: &str,
        entry: &Entry,
        input: Value,
        metadata: Option<Metadata>,
    ) -> Result<RunResult> {
        info!(workflow = %id, "Running workflow");
        let started_at = Utc::now();

        let mut ctx = ExecutionContext::with_metadata(metadata.unwrap_or_default());
        *ctx.attachments_mut() = self.attachments.clone();

        match &entry.workflow {
            RegisteredWorkflow::Local(workflow) => {
                let result = workflow.execute_in(input, &ctx, |_| {}).await;
                Ok(RunResult::from_workflow(id, started_at, result))
            }
            RegisteredWorkflow::Provided(instance) => {
                let result = self
                    .facade
                    .execute(WorkflowRef::Instance(instance), input, Some(ctx))
                    .await?;
                Ok(RunResult::from_execution(id, started_at, result))
            }
        }
    }

    /// Run several workflows concurrently.
    ///
    /// Every id is resolved before anything starts. All workflows run to
    /// completion; results are in the order of `configs`.
    pub async fn run_workflows_parallel(&self, configs: &[RunConfig]) -> Result<Vec<RunResult>> {
        let entries = configs
            .iter()
            .map(|config| self.lookup(&config.workflow))
            .collect::<Result<Vec<_>>>()?;

        info!(count = configs.len(), "Running workflows in parallel");

        let runs = configs.iter().zip(entries).map(|(config, entry)| {
            self.run_entry(
                &config.workflow,
                entry,
                config.input.clone().unwrap_or(Value::Null),
                config.metadata.clone(),
            )
        });

        join_all(runs).await.into_iter().collect()
    }

    /// Run several workflows one after another, chaining outputs.
    ///
    /// An entry without input receives the output of the most recent
    /// successful run before it. A failed run does not stop the sequence.
    pub async fn run_workflows_sequential(
        &self,
        configs: &[RunConfig],
    ) -> Result<Vec<RunResult>> {
        info!(count = configs.len(), "Running workflows in sequence");

        let mut results = Vec::with_capacity(configs.len());
        let mut carried = Value::Null;

        for config in configs {
            let input = config.input.clone().unwrap_or_else(|| carried.clone());
            let result = self
                .run_workflow(&config.workflow, input, config.metadata.clone())
                .await?;

            if result.success {
                carried = result.data.clone().unwrap_or(Value::Null);
            }
            results.push(result);
        }

        Ok(results)
    }
}
