//! Configuration loading, parsing, and validation for stepwise.
//!
//! This module handles all aspects of pipeline configuration:
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//! - Validation in [`validator`]
//! - Variable interpolation in [`interpolation`]
//! - Building a runner in [`builder`]
//!
//! # Example
//!
//! ```
//! use stepwise::actions::StepRegistry;
//! use stepwise::config::{build_runner, load_merged_config};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let config_dir = temp.path().join(".stepwise");
//! fs::create_dir_all(&config_dir).unwrap();
//! fs::write(
//!     config_dir.join("config.yml"),
//!     "workflows:\n  hello:\n    steps:\n      - name: pass\n        type: echo\n",
//! )
//! .unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! let runner = build_runner(&config, &StepRegistry::builtin()).unwrap();
//! assert_eq!(runner.workflows(), vec!["hello"]);
//! ```
//!
//! # Configuration File Locations
//!
//! stepwise discovers and merges configuration in this order:
//! 1. Project config (`.stepwise/config.yml`)
//! 2. Local overrides (`.stepwise/config.local.yml`)
//!
//! Passing an explicit path loads that file alone.

pub mod builder;
pub mod interpolation;
pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use builder::{build_runner, register_workflows};
pub use interpolation::{
    extract_variables, has_interpolation, parse_interpolation, resolve_string, resolve_value,
    InterpolationContext, Segment,
};
pub use loader::{
    find_project_root, load_config, load_config_file, load_config_value, load_merged_config,
    parse_config, project_config_path, ConfigPaths, CONFIG_DIR,
};
pub use merger::{deep_merge, merge_configs};
pub use schema::{OutputMode, Settings, StepDefinition, StepwiseConfig, WorkflowDefinition};
pub use validator::{validate, validate_config, ValidationError};
