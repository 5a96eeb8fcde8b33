//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::ui::UserInterface;

/// Exit code when a workflow or step fails, or the command errors.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code when no configuration was found.
pub const EXIT_NO_CONFIG: i32 = 2;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
#[async_trait(?Send)]
pub trait Command {
    /// Execute the command.
    ///
    /// Returns a [`CommandResult`] indicating success/failure and exit code.
    async fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Success when `ok`, otherwise [`EXIT_FAILURE`].
    pub fn from_success(ok: bool) -> Self {
        if ok {
            Self::success()
        } else {
            Self::failure(EXIT_FAILURE)
        }
    }
}

/// Settings shared by every command in one invocation.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Project root; relative step paths resolve against it.
    pub project_root: PathBuf,
    /// Explicit config file, loaded alone.
    pub config_path: Option<PathBuf>,
    /// Print results as JSON.
    pub json: bool,
}

impl CommandContext {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            config_path: None,
            json: false,
        }
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    context: CommandContext,
}

impl CommandDispatcher {
    /// Create a new dispatcher.
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.context.project_root
    }

    /// Dispatch and execute a command.
    pub async fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let context = self.context.clone();
        match &cli.command {
            Commands::Run(args) => {
                super::run::RunCommand::new(context, args.clone())
                    .execute(ui)
                    .await
            }
            Commands::Step(args) => {
                super::step::StepCommand::new(context, args.clone())
                    .execute(ui)
                    .await
            }
            Commands::List(args) => {
                super::list::ListCommand::new(context, args.clone())
                    .execute(ui)
                    .await
            }
            Commands::Completions(args) => {
                super::completions::CompletionsCommand::new(args.clone())
                    .execute(ui)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(EXIT_NO_CONFIG);
        assert!(!result.success);
        assert_eq!(result.exit_code, 2);
    }

    #[test]
    fn command_result_from_success() {
        assert_eq!(CommandResult::from_success(true).exit_code, 0);
        assert_eq!(CommandResult::from_success(false).exit_code, EXIT_FAILURE);
    }

    #[test]
    fn dispatcher_creation() {
        let context = CommandContext::new("/test")
            .with_config_path(Some(PathBuf::from("/test/pipeline.yml")))
            .with_json(true);
        let dispatcher = CommandDispatcher::new(context);
        assert_eq!(dispatcher.project_root(), Path::new("/test"));
    }
}
