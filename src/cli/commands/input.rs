//! Loading configuration and parsing command input.

use std::fs;

use anyhow::Context as _;
use serde_json::Value;

use crate::cli::args::InputArgs;
use crate::config::{load_config, StepwiseConfig};
use crate::error::{Result, StepwiseError};
use crate::steps::Metadata;
use crate::ui::{OutputMode, UserInterface};

use super::dispatcher::CommandContext;

/// Load the project configuration.
///
/// Returns `Ok(None)` after reporting to the user when no configuration
/// exists. Applies the configured default output mode unless a flag set one.
pub fn load_project_config(
    context: &CommandContext,
    ui: &mut dyn UserInterface,
) -> Result<Option<StepwiseConfig>> {
    let config = match load_config(&context.project_root, context.config_path.as_deref()) {
        Ok(config) => config,
        Err(StepwiseError::ConfigNotFound { path }) => {
            ui.error(&format!("No configuration found at {}", path.display()));
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    if ui.output_mode() == OutputMode::Normal {
        ui.set_output_mode(config.settings.default_output.into());
    }

    Ok(Some(config))
}

/// Read the JSON input from `--input` or `--input-file`.
///
/// Returns `None` when neither was given.
pub fn read_input(args: &InputArgs) -> Result<Option<Value>> {
    if let Some(text) = &args.input {
        let value = serde_json::from_str(text).context("--input is not valid JSON")?;
        return Ok(Some(value));
    }

    if let Some(path) = &args.input_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display()))?;
        let value = serde_json::from_str(&text)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;
        return Ok(Some(value));
    }

    Ok(None)
}

/// Parse `KEY=VALUE` pairs into run metadata.
///
/// Values that parse as JSON keep their type; anything else is a string.
pub fn parse_metadata(pairs: &[String]) -> Result<Metadata> {
    let mut metadata = Metadata::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(StepwiseError::ConfigValidationError {
                message: format!("Metadata '{}' must be KEY=VALUE", pair),
            });
        };
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        metadata.insert(key.trim().to_string(), value);
    }
    Ok(metadata)
}
