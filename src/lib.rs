//! Stepwise - composable steps and workflows over JSON values.
//!
//! A [`steps::Step`] wraps one unit of async work with input/output shape
//! validation, timing, and fault capture. Steps chain into
//! [`workflow::Workflow`]s, and a [`runner::WorkflowRunner`] runs registered
//! workflows singly, in sequence, or in parallel. Workflows can also be
//! declared in YAML and built through [`config`].
//!
//! # Modules
//!
//! - [`actions`] - Built-in step types (shell, file, http, git, transform)
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, interpolation, and validation
//! - [`error`] - Error types and result aliases
//! - [`logging`] - Tracing subscriber setup
//! - [`provider`] - Pluggable execution backends and the workflow facade
//! - [`runner`] - Workflow registration and orchestration
//! - [`shell`] - Shell command execution
//! - [`steps`] - Steps, validators, and execution context
//! - [`ui`] - Terminal output
//! - [`workflow`] - Ordered pipelines of steps
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use stepwise::steps::Step;
//! use stepwise::workflow::Workflow;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let double = Step::from_fn("double", |input, _ctx| async move {
//!     Ok(json!(input.as_i64().unwrap_or(0) * 2))
//! });
//! let workflow = Workflow::new("math").add_step(double.clone()).add_step(double);
//!
//! let result = workflow.execute(json!(3), None).await;
//! assert!(result.success);
//! assert_eq!(result.data(), Some(&json!(12)));
//! # });
//! ```

pub mod actions;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod ui;
pub mod workflow;

pub use error::{Result, StepwiseError};
