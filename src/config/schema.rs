//! Configuration schema definitions for stepwise.
//!
//! This module contains the struct definitions that map to the
//! `.stepwise/config.yml` file format.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Root configuration structure for `.stepwise/config.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepwiseConfig {
    /// Application name (for display purposes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Global settings
    pub settings: Settings,

    /// Workflow definitions keyed by id
    pub workflows: HashMap<String, WorkflowDefinition>,
}

/// Global settings that apply to all workflows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default for workflows that don't set `continue_on_error`
    #[serde(skip_serializing_if = "is_false")]
    pub continue_on_error: bool,

    /// Default output mode: verbose, quiet, silent
    pub default_output: OutputMode,
}

fn is_false(v: &bool) -> bool {
    !v
}

/// Output verbosity mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Verbose,
    Quiet,
    Silent,
}

/// A workflow: an ordered list of steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowDefinition {
    /// Workflow description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Keep running after a failed step (overrides the global setting)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,

    /// JSON Schema for the workflow input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,

    /// JSON Schema for the workflow output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,

    /// Steps in execution order
    pub steps: Vec<StepDefinition>,
}

/// A single configured step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Step name, unique within its workflow
    pub name: String,

    /// Registered step type (`shell`, `http`, ...)
    #[serde(rename = "type")]
    pub step_type: String,

    /// Step description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Type-specific parameters; may contain `${...}` references
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,

    /// JSON Schema for the step input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,

    /// JSON Schema for the step output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

impl StepwiseConfig {
    /// Workflow ids, sorted.
    pub fn workflow_ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.workflows.keys().map(String::as_str).collect();
        ids.sort();
        ids
    }

    /// Whether a workflow keeps running after a failed step.
    pub fn continues_on_error(&self, workflow: &WorkflowDefinition) -> bool {
        workflow
            .continue_on_error
            .unwrap_or(self.settings.continue_on_error)
    }
}
