//! Registry and delegation layer in front of a provider.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};

use super::{
    ExecutionResult, LocalProvider, Provider, StepConfig, StepInstance, WorkflowConfig,
    WorkflowInstance,
};
use crate::error::{Result, StepwiseError};
use crate::steps::ExecutionContext;

/// A workflow to execute: a registered id or an instance in hand.
#[derive(Debug, Clone, Copy)]
pub enum WorkflowRef<'a> {
    Id(&'a str),
    Instance(&'a WorkflowInstance),
}

impl<'a> From<&'a str> for WorkflowRef<'a> {
    fn from(id: &'a str) -> Self {
        WorkflowRef::Id(id)
    }
}

impl<'a> From<&'a WorkflowInstance> for WorkflowRef<'a> {
    fn from(instance: &'a WorkflowInstance) -> Self {
        WorkflowRef::Instance(instance)
    }
}

/// Holds built workflow instances by id and forwards work to a provider.
///
/// Registered instances are shared read-only; re-registering an id
/// replaces the previous instance.
pub struct WorkflowFacade {
    provider: Arc<dyn Provider>,
    workflows: HashMap<String, Arc<WorkflowInstance>>,
}

impl Default for WorkflowFacade {
    fn default() -> Self {
        Self::new(Arc::new(LocalProvider))
    }
}

impl fmt::Debug for WorkflowFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.workflows.keys().collect();
        ids.sort();
        f.debug_struct("WorkflowFacade")
            .field("provider", &self.provider.name())
            .field("workflows", &ids)
            .finish()
    }
}

impl WorkflowFacade {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            workflows: HashMap::new(),
        }
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Build a step through the provider.
    pub fn create_step(&self, config: StepConfig) -> Result<StepInstance> {
        self.provider.create_step(config)
    }

    /// Build a workflow through the provider and register it under its id.
    pub fn create_workflow(&mut self, config: WorkflowConfig) -> Result<Arc<WorkflowInstance>> {
        let instance = self.provider.create_workflow(config)?;
        Ok(self.register(instance))
    }

    /// Register an already built instance under its id.
    pub fn register(&mut self, instance: WorkflowInstance) -> Arc<WorkflowInstance> {
        let instance = Arc::new(instance);
        let id = instance.id().to_string();
        if self.workflows.insert(id.clone(), instance.clone()).is_some() {
            debug!(workflow = %id, "Replacing registered workflow instance");
        }
        info!(workflow = %id, provider = self.provider.name(), "Registered workflow instance");
        instance
    }

    pub fn get(&self, id: &str) -> Option<Arc<WorkflowInstance>> {
        self.workflows.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.workflows.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn workflow_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.workflows.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Execute a registered or in-hand workflow.
    ///
    /// An unknown id is an error; everything that happens while the
    /// workflow runs is reported in the [`ExecutionResult`].
    pub async fn execute(
        &self,
        target: WorkflowRef<'_>,
        input: Value,
        ctx: Option<ExecutionContext>,
    ) -> Result<ExecutionResult> {
        match target {
            WorkflowRef::Instance(instance) => self.provider.execute(instance, input, ctx).await,
            WorkflowRef::Id(id) => {
                let instance = self.workflows.get(id).cloned().ok_or_else(|| {
                    error!(workflow = %id, "Workflow not found");
                    StepwiseError::WorkflowNotFound { id: id.to_string() }
                })?;
                self.provider.execute(&instance, input, ctx).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn double() -> StepConfig {
        StepConfig::from_fn("double", |input, _ctx| async move {
            Ok(json!(input.as_i64().unwrap_or(0) * 2))
        })
    }

    #[tokio::test]
    async fn executes_registered_workflow_by_id() {
        let mut facade = WorkflowFacade::default();
        let step = facade.create_step(double()).unwrap();
        facade
            .create_workflow(WorkflowConfig::new("doubler").with_step(step))
            .unwrap();

        let result = facade
            .execute(WorkflowRef::Id("doubler"), json!(21), None)
            .await
            .unwrap();
        assert_eq!(result.data, Some(json!(42)));
    }

    #[tokio::test]
    async fn executes_unregistered_instance() {
        let facade = WorkflowFacade::default();
        let instance = WorkflowInstance::from_config(
            WorkflowConfig::new("loose").with_step(StepInstance::from_config(double()).unwrap()),
        )
        .unwrap();

        let result = facade.execute((&instance).into(), json!(4), None).await.unwrap();
        assert_eq!(result.data, Some(json!(8)));
        assert!(!facade.contains("loose"));
    }

    #[tokio::test]
    async fn unknown_id_is_workflow_not_found() {
        let facade = WorkflowFacade::default();
        let err = facade
            .execute("NoSuchWorkflow".into(), json!({}), None)
            .await
            .unwrap_err();

        assert!(matches!(err, StepwiseError::WorkflowNotFound { ref id } if id == "NoSuchWorkflow"));
        assert!(err.to_string().contains("NoSuchWorkflow"));
    }

    #[test]
    fn re_registering_replaces_instance() {
        let mut facade = WorkflowFacade::default();
        facade
            .create_workflow(WorkflowConfig::new("wf").with_description("first"))
            .unwrap();
        facade
            .create_workflow(WorkflowConfig::new("wf").with_description("second"))
            .unwrap();

        assert_eq!(facade.workflow_ids(), vec!["wf".to_string()]);
        assert_eq!(facade.get("wf").unwrap().description(), Some("second"));
    }

    struct CountingProvider {
        executions: AtomicUsize,
    }

    #[async_trait]
    impl Provider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn create_step(&self, config: StepConfig) -> Result<StepInstance> {
            StepInstance::from_config(config)
        }

        fn create_workflow(&self, config: WorkflowConfig) -> Result<WorkflowInstance> {
            WorkflowInstance::from_config(config)
        }

        async fn execute(
            &self,
            workflow: &WorkflowInstance,
            _input: Value,
            _ctx: Option<ExecutionContext>,
        ) -> Result<ExecutionResult> {
            let n = self.executions.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ExecutionResult {
                success: true,
                data: Some(json!({ "workflow": workflow.id(), "run": n })),
                error: None,
                duration: Duration::ZERO,
                steps: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn delegates_to_active_provider() {
        let provider = Arc::new(CountingProvider {
            executions: AtomicUsize::new(0),
        });
        let mut facade = WorkflowFacade::new(provider.clone());
        facade.create_workflow(WorkflowConfig::new("remote")).unwrap();

        let first = facade.execute("remote".into(), Value::Null, None).await.unwrap();
        let second = facade.execute("remote".into(), Value::Null, None).await.unwrap();

        assert_eq!(first.data, Some(json!({"workflow": "remote", "run": 1})));
        assert_eq!(second.data, Some(json!({"workflow": "remote", "run": 2})));
        assert_eq!(provider.executions.load(Ordering::SeqCst), 2);
        assert!(format!("{:?}", facade).contains("counting"));
    }
}
