//! Error types for stepwise operations.
//!
//! This module defines [`StepwiseError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Failures inside a step never surface as `StepwiseError`; they are folded
//!   into a failed [`StepResult`](crate::steps::StepResult).
//! - `StepwiseError` covers configuration and identity problems (unknown
//!   workflow, unknown step type, bad schema) that have no partial result.
//! - Use `anyhow::Error` (via `StepwiseError::Other`) for unexpected errors.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The stage at which a shape validation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationStage {
    /// Before the handler is called.
    Input,
    /// After the handler returned data.
    Output,
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStage::Input => write!(f, "Input"),
            ValidationStage::Output => write!(f, "Output"),
        }
    }
}

/// The kind of entity a schema belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Step,
    Workflow,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Step => write!(f, "step"),
            EntityKind::Workflow => write!(f, "workflow"),
        }
    }
}

/// Core error type for stepwise operations.
#[derive(Debug, Error)]
pub enum StepwiseError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// No workflow is registered under the requested identifier.
    #[error("Workflow not found: {id}")]
    WorkflowNotFound { id: String },

    /// No factory is registered for a step type.
    #[error("Unknown step type: {name}")]
    UnknownStepType { name: String },

    /// A value did not match the configured shape.
    #[error("{stage} validation failed for {entity} '{id}': {message}")]
    SchemaValidation {
        stage: ValidationStage,
        entity: EntityKind,
        id: String,
        message: String,
    },

    /// A schema document could not be compiled.
    #[error("Invalid schema for {entity} '{id}': {message}")]
    InvalidSchema {
        entity: EntityKind,
        id: String,
        message: String,
    },

    /// Step execution failed.
    #[error("Step '{step}' failed: {message}")]
    StepExecutionError { step: String, message: String },

    /// Shell command failed.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// Shell command did not finish in time.
    #[error("Command timed out after {secs}s: {command}")]
    CommandTimeout { command: String, secs: u64 },

    /// Shell command could not be started.
    #[error("Failed to start command '{command}': {message}")]
    CommandSpawn { command: String, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for stepwise operations.
pub type Result<T> = std::result::Result<T, StepwiseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_displays_path() {
        let err = StepwiseError::ConfigNotFound {
            path: PathBuf::from("/foo/config.yml"),
        };
        assert!(err.to_string().contains("/foo/config.yml"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = StepwiseError::ConfigParseError {
            path: PathBuf::from("/config.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/config.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn workflow_not_found_displays_id() {
        let err = StepwiseError::WorkflowNotFound {
            id: "NoSuchWorkflow".into(),
        };
        assert!(err.to_string().contains("NoSuchWorkflow"));
    }

    #[test]
    fn schema_validation_names_stage_entity_and_message() {
        let err = StepwiseError::SchemaValidation {
            stage: ValidationStage::Output,
            entity: EntityKind::Workflow,
            id: "deploy".into(),
            message: "\"x\" is not of type \"number\"".into(),
        };
        assert_eq!(
            err.to_string(),
            "Output validation failed for workflow 'deploy': \"x\" is not of type \"number\""
        );
    }

    #[test]
    fn invalid_schema_displays_entity() {
        let err = StepwiseError::InvalidSchema {
            entity: EntityKind::Step,
            id: "fetch".into(),
            message: "bad type".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("step 'fetch'"));
        assert!(msg.contains("bad type"));
    }

    #[test]
    fn unknown_step_type_displays_name() {
        let err = StepwiseError::UnknownStepType {
            name: "ftp".into(),
        };
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn command_failed_displays_command_and_code() {
        let err = StepwiseError::CommandFailed {
            command: "npm install".into(),
            code: Some(1),
        };
        let msg = err.to_string();
        assert!(msg.contains("npm install"));
        assert!(msg.contains("1"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: StepwiseError = io_err.into();
        assert!(matches!(err, StepwiseError::Io(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(StepwiseError::ConfigValidationError {
                message: "test".into(),
            })
        }
        assert!(returns_error().is_err());
    }
}
