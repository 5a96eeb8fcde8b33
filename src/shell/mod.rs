//! Shell command execution.

pub mod command;

pub use command::{execute, execute_program, CommandOptions, CommandResult};
