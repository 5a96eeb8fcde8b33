//! Configuration file discovery and loading.
//!
//! This module finds the pipeline configuration for a project and layers
//! local overrides on top of it.

use crate::config::merger::merge_configs;
use crate::config::schema::StepwiseConfig;
use crate::error::{Result, StepwiseError};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".stepwise";

/// Paths to configuration files in priority order (later overrides earlier).
///
/// Merge order:
/// 1. Project config (`.stepwise/config.yml`)
/// 2. Local overrides (`.stepwise/config.local.yml`)
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project config: .stepwise/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .stepwise/config.local.yml
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            project: existing(project_config_path(project_root)),
            project_local: existing(project_root.join(CONFIG_DIR).join("config.local.yml")),
        }
    }

    /// Returns all existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.project.iter().chain(self.project_local.iter()).collect()
    }

    /// Check if a project config exists.
    pub fn has_project_config(&self) -> bool {
        self.project.is_some()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Where the project config lives for a project root.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.yml")
}

/// Find the project root by walking up from `start`.
///
/// Looks for:
/// 1. `.stepwise` directory (primary indicator)
/// 2. `.git` directory (fallback)
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(CONFIG_DIR).is_dir() {
            return Some(current);
        }

        if current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load a single config file and parse it into `StepwiseConfig`.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<StepwiseConfig> {
    let value = load_config_value(path)?;
    from_value(value, path)
}

/// Parse YAML content into `StepwiseConfig`.
pub fn parse_config(content: &str, source_path: &Path) -> Result<StepwiseConfig> {
    serde_yaml::from_str(content).map_err(|e| StepwiseError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a config file as a raw value (for merging).
///
/// An empty file loads as an empty mapping.
pub fn load_config_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StepwiseError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            StepwiseError::Io(e)
        }
    })?;

    if content.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    let value: Value =
        serde_yaml::from_str(&content).map_err(|e| StepwiseError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(match value {
        Value::Null => Value::Object(Default::default()),
        other => other,
    })
}

fn from_value(value: Value, path: &Path) -> Result<StepwiseConfig> {
    serde_json::from_value(value).map_err(|e| StepwiseError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load and merge the project config with its local overrides.
///
/// # Errors
///
/// Returns `ConfigNotFound` if no project config exists.
/// Returns `ConfigParseError` if any config file is invalid.
pub fn load_merged_config(project_root: &Path) -> Result<StepwiseConfig> {
    let paths = ConfigPaths::discover(project_root);

    if !paths.has_project_config() {
        return Err(StepwiseError::ConfigNotFound {
            path: project_config_path(project_root),
        });
    }

    let configs = paths
        .all_existing()
        .into_iter()
        .map(|path| load_config_value(path))
        .collect::<Result<Vec<_>>>()?;

    let merged = merge_configs(&configs);

    serde_json::from_value(merged).map_err(|e| StepwiseError::ConfigParseError {
        path: project_config_path(project_root),
        message: format!("Failed to parse merged config: {}", e),
    })
}

/// Load config with optional path override.
///
/// If `config_override` is provided, loads only that file without merging.
/// Otherwise, discovers and merges the project config files.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<StepwiseConfig> {
    if let Some(override_path) = config_override {
        load_config_file(override_path)
    } else {
        load_merged_config(project_root)
    }
}
