//! Stepwise CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use stepwise::cli::{Cli, CommandContext, CommandDispatcher};
use stepwise::config::find_project_root;
use stepwise::logging::init_tracing;
use stepwise::ui::{create_ui, OutputMode};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("Stepwise starting with args: {:?}", cli);

    // Determine output mode; JSON output owns stdout
    let output_mode = if cli.json {
        OutputMode::Silent
    } else if cli.quiet {
        OutputMode::Quiet
    } else if cli.verbose {
        OutputMode::Verbose
    } else {
        OutputMode::Normal
    };

    // Handle --no-color
    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    // Determine project root
    let project_root = match &cli.project {
        Some(path) => path.clone(),
        None => {
            let cwd = std::env::current_dir().unwrap_or_default();
            find_project_root(&cwd).unwrap_or(cwd)
        }
    };

    let mut ui = create_ui(output_mode);

    let context = CommandContext::new(project_root)
        .with_config_path(cli.config.clone())
        .with_json(cli.json);
    let dispatcher = CommandDispatcher::new(context);

    match dispatcher.dispatch(&cli, ui.as_mut()).await {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            ExitCode::from(1)
        }
    }
}
