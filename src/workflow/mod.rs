//! Workflows: ordered pipelines of steps.

pub mod definition;
pub mod result;

pub use definition::{Workflow, WorkflowProgress, WorkflowStep};
pub use result::WorkflowResult;
