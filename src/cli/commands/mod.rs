//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`stepwise run`, `stepwise list`)
//! - Shared config loading and input parsing
//! - Consistent global flag handling

pub mod completions;
pub mod dispatcher;
pub mod display;
pub mod input;
pub mod list;
pub mod run;
pub mod step;

pub use dispatcher::{
    Command, CommandContext, CommandDispatcher, CommandResult, EXIT_FAILURE, EXIT_NO_CONFIG,
};
