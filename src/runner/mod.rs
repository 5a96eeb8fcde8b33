//! Workflow orchestration.

pub mod identity;
pub mod result;
pub mod workflow;

pub use identity::{RegisteredWorkflow, WorkflowIdentity, UNNAMED_WORKFLOW};
pub use result::{RunConfig, RunResult};
pub use workflow::WorkflowRunner;
