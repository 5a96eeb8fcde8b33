//! Shell completions generation.
//!
//! The `stepwise completions` command generates shell completion scripts.

use async_trait::async_trait;
use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::args::{Cli, CompletionsArgs};
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The completions command implementation.
pub struct CompletionsCommand {
    args: CompletionsArgs,
}

impl CompletionsCommand {
    /// Create a new completions command.
    pub fn new(args: CompletionsArgs) -> Self {
        Self { args }
    }
}

/// Render the completion script for `shell`.
pub fn render(shell: Shell) -> String {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut cmd, "stepwise", &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

#[async_trait(?Send)]
impl Command for CompletionsCommand {
    async fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        ui.print_raw(&render(self.args.shell));
        Ok(CommandResult::success())
    }
}
