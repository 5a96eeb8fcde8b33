//! What a runner can hold and the key it is held under.

use std::fmt;
use std::sync::Arc;

use crate::provider::WorkflowInstance;
use crate::workflow::Workflow;

/// Key used when a workflow has no usable identifier.
pub const UNNAMED_WORKFLOW: &str = "unnamed-workflow";

/// A workflow the runner can execute.
#[derive(Debug, Clone)]
pub enum RegisteredWorkflow {
    /// An in-process [`Workflow`], executed directly.
    Local(Arc<Workflow>),
    /// A provider-built instance, executed through the facade.
    Provided(Arc<WorkflowInstance>),
}

impl RegisteredWorkflow {
    /// Human-readable name.
    pub fn display_name(&self) -> &str {
        match self {
            RegisteredWorkflow::Local(workflow) => workflow.name(),
            RegisteredWorkflow::Provided(instance) => instance.display_name(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            RegisteredWorkflow::Local(workflow) => workflow.description(),
            RegisteredWorkflow::Provided(instance) => instance.description(),
        }
    }

    /// Labels of the steps, in order.
    pub fn step_names(&self) -> Vec<&str> {
        match self {
            RegisteredWorkflow::Local(workflow) => {
                workflow.steps().iter().map(|s| s.label.as_str()).collect()
            }
            RegisteredWorkflow::Provided(instance) => {
                instance.steps().iter().map(|s| s.id()).collect()
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RegisteredWorkflow::Local(_) => "local",
            RegisteredWorkflow::Provided(_) => "provided",
        }
    }
}

impl From<Workflow> for RegisteredWorkflow {
    fn from(workflow: Workflow) -> Self {
        RegisteredWorkflow::Local(Arc::new(workflow))
    }
}

impl From<Arc<Workflow>> for RegisteredWorkflow {
    fn from(workflow: Arc<Workflow>) -> Self {
        RegisteredWorkflow::Local(workflow)
    }
}

impl From<WorkflowInstance> for RegisteredWorkflow {
    fn from(instance: WorkflowInstance) -> Self {
        RegisteredWorkflow::Provided(Arc::new(instance))
    }
}

impl From<Arc<WorkflowInstance>> for RegisteredWorkflow {
    fn from(instance: Arc<WorkflowInstance>) -> Self {
        RegisteredWorkflow::Provided(instance)
    }
}

/// Identity of a registered workflow, resolved once at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowIdentity {
    /// An explicit id, or the id carried by a provider instance.
    Named(String),
    /// The name of an in-process workflow.
    Legacy(String),
    /// Nothing usable; held under [`UNNAMED_WORKFLOW`].
    Anonymous,
}

impl WorkflowIdentity {
    /// Resolve: explicit id, then the instance id (or name), then the
    /// workflow name, then anonymous.
    pub fn resolve(explicit: Option<&str>, workflow: &RegisteredWorkflow) -> Self {
        if let Some(id) = explicit.filter(|id| !id.is_empty()) {
            return WorkflowIdentity::Named(id.to_string());
        }

        match workflow {
            RegisteredWorkflow::Provided(instance) => {
                if !instance.id().is_empty() {
                    WorkflowIdentity::Named(instance.id().to_string())
                } else {
                    match instance.name().filter(|n| !n.is_empty()) {
                        Some(name) => WorkflowIdentity::Named(name.to_string()),
                        None => WorkflowIdentity::Anonymous,
                    }
                }
            }
            RegisteredWorkflow::Local(workflow) if !workflow.name().is_empty() => {
                WorkflowIdentity::Legacy(workflow.name().to_string())
            }
            RegisteredWorkflow::Local(_) => WorkflowIdentity::Anonymous,
        }
    }

    /// The registry key.
    pub fn key(&self) -> &str {
        match self {
            WorkflowIdentity::Named(id) | WorkflowIdentity::Legacy(id) => id,
            WorkflowIdentity::Anonymous => UNNAMED_WORKFLOW,
        }
    }
}

impl fmt::Display for WorkflowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
