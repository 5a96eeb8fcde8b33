//! Step results and failure values.

use std::fmt;
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;

use super::context::Metadata;
use crate::error::ValidationStage;

/// What went wrong inside a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepErrorKind {
    /// Input or output did not match the configured shape.
    Validation(ValidationStage),
    /// The handler returned an error.
    Execution,
    /// The handler panicked.
    Panic,
}

impl fmt::Display for StepErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepErrorKind::Validation(ValidationStage::Input) => write!(f, "input_validation"),
            StepErrorKind::Validation(ValidationStage::Output) => write!(f, "output_validation"),
            StepErrorKind::Execution => write!(f, "execution"),
            StepErrorKind::Panic => write!(f, "panic"),
        }
    }
}

/// A failure captured at the step boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StepError {
    /// Failure classification.
    pub kind: StepErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl StepError {
    /// Create a validation failure.
    pub fn validation(stage: ValidationStage, message: impl Into<String>) -> Self {
        Self {
            kind: StepErrorKind::Validation(stage),
            message: message.into(),
        }
    }

    /// Create an execution failure.
    pub fn execution(message: impl Into<String>) -> Self {
        Self {
            kind: StepErrorKind::Execution,
            message: message.into(),
        }
    }

    /// Create a failure from a caught panic.
    pub fn panic(message: impl Into<String>) -> Self {
        Self {
            kind: StepErrorKind::Panic,
            message: message.into(),
        }
    }

    /// Whether this failure came from shape validation.
    pub fn is_validation(&self) -> bool {
        matches!(self.kind, StepErrorKind::Validation(_))
    }

    /// JSON form used in machine-readable output.
    pub fn to_json(&self) -> Value {
        json!({
            "kind": self.kind.to_string(),
            "message": self.message,
        })
    }
}

/// Status of a finished step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Step completed successfully.
    Completed,

    /// Step failed.
    Failed,
}

impl StepStatus {
    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            StepStatus::Completed => '✓',
            StepStatus::Failed => '✗',
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Result of executing a step.
///
/// Produced fresh by every [`Step::execute`](super::Step::execute) call.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Step name (or the label it ran under inside a workflow).
    pub name: String,

    /// Whether the step succeeded.
    pub success: bool,

    /// Output data. `None` when the step failed or produced `null`.
    pub data: Option<Value>,

    /// Failure (if any).
    pub error: Option<StepError>,

    /// Extra keyed information about the run.
    pub metadata: Metadata,

    /// Execution duration.
    pub duration: Duration,
}

impl StepResult {
    /// Create a success result. A `null` output is stored as no data.
    pub fn success(name: &str, data: Value, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            data: (!data.is_null()).then_some(data),
            error: None,
            metadata: Metadata::new(),
            duration,
        }
    }

    /// Create a failure result.
    pub fn failure(name: &str, error: StepError, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            data: None,
            error: Some(error),
            metadata: Metadata::new(),
            duration,
        }
    }

    /// Attach metadata (builder style, used before the result is returned).
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Get the status of this result.
    pub fn status(&self) -> StepStatus {
        if self.success {
            StepStatus::Completed
        } else {
            StepStatus::Failed
        }
    }

    /// The data as a value, `null` when absent.
    pub fn data_or_null(&self) -> Value {
        self.data.clone().unwrap_or(Value::Null)
    }

    /// Generate a summary line for display.
    pub fn summary_line(&self) -> String {
        let status = self.status();
        match status {
            StepStatus::Completed => format!(
                "{} {} ({})",
                status.display_char(),
                self.name,
                format_duration(self.duration)
            ),
            StepStatus::Failed => {
                let error = self
                    .error
                    .as_ref()
                    .map(|e| e.message.as_str())
                    .unwrap_or("unknown error");
                format!("{} {} - {}", status.display_char(), self.name, error)
            }
        }
    }

    /// JSON form used in machine-readable output.
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "success": self.success,
            "data": self.data,
            "error": self.error.as_ref().map(StepError::to_json),
            "metadata": self.metadata,
            "duration_ms": self.duration.as_millis() as u64,
        })
    }
}

/// Format a duration for display.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{}s", secs, millis / 100)
    } else {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_with_null_has_no_data() {
        let result = StepResult::success("noop", Value::Null, Duration::ZERO);
        assert!(result.success);
        assert!(result.data.is_none());
        assert_eq!(result.data_or_null(), Value::Null);
    }

    #[test]
    fn step_result_status() {
        let result = StepResult::success("test", json!(1), Duration::from_secs(1));
        assert_eq!(result.status(), StepStatus::Completed);

        let result = StepResult::failure(
            "test",
            StepError::execution("error"),
            Duration::from_secs(1),
        );
        assert_eq!(result.status(), StepStatus::Failed);
    }

    #[test]
    fn summary_line_includes_error_message() {
        let result = StepResult::failure(
            "deploy",
            StepError::execution("connection refused"),
            Duration::from_millis(5),
        );
        let line = result.summary_line();
        assert!(line.contains('✗'));
        assert!(line.contains("deploy"));
        assert!(line.contains("connection refused"));
    }

    #[test]
    fn step_error_kinds() {
        assert!(StepError::validation(ValidationStage::Input, "bad").is_validation());
        assert!(!StepError::execution("bad").is_validation());
        assert_eq!(StepError::panic("boom").kind, StepErrorKind::Panic);
        assert_eq!(StepError::execution("Failed").to_string(), "Failed");
    }

    #[test]
    fn to_json_reports_duration_in_millis() {
        let result = StepResult::success("a", json!({"value": 1}), Duration::from_millis(1500))
            .with_metadata("label", json!("first"));
        let value = result.to_json();
        assert_eq!(value["duration_ms"], json!(1500));
        assert_eq!(value["data"]["value"], json!(1));
        assert_eq!(value["metadata"]["label"], json!("first"));
        assert!(value["error"].is_null());
    }

    #[test]
    fn format_duration_formats_correctly() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(5)), "5.0s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }
}
