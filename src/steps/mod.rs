//! Steps: the smallest unit of work.
//!
//! - [`Step`] - a named handler wrapped with validation, timing, logging,
//!   and fault capture
//! - [`StepHandler`] - the work itself
//! - [`ShapeValidator`] - input/output shape checks ([`JsonSchema`],
//!   [`FnValidator`])
//! - [`ExecutionContext`] - span, metadata, and typed attachments
//! - [`StepResult`] - the outcome of one execution
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use stepwise::steps::{ExecutionContext, Step};
//!
//! # tokio_test_block(async {
//! let step = Step::from_fn("add", |input, _ctx| async move {
//!     let value = input["value"].as_i64().unwrap_or(0);
//!     Ok(json!({ "value": value + 5 }))
//! });
//!
//! let result = step.execute(json!({"value": 10}), &ExecutionContext::new()).await;
//! assert!(result.success);
//! assert_eq!(result.data, Some(json!({"value": 15})));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

pub mod context;
pub mod definition;
pub mod result;
pub mod validator;

pub use context::{Attachments, ExecutionContext, Metadata};
pub use definition::{FnHandler, Step, StepHandler};
pub use result::{format_duration, StepError, StepErrorKind, StepResult, StepStatus};
pub use validator::{FnValidator, JsonSchema, ShapeValidator};
