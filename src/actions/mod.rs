//! Built-in step types and the registry that builds steps by type name.
//!
//! Every built-in is an ordinary [`Step`]: the registry only maps a type
//! name from configuration (`shell`, `http`, ...) to a factory that turns
//! `params` into a step. Parameters are interpolated against the step
//! input when the step runs, so `${input.field}` references see the output
//! of the previous step.

pub mod file;
pub mod git;
pub mod http;
pub mod shell;
pub mod transform;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::interpolation::{resolve_value, InterpolationContext};
use crate::error::{Result, StepwiseError};
use crate::steps::{ExecutionContext, Step};

/// Builds a step from its configured name and parameters.
pub type StepFactory = dyn Fn(&str, &Value) -> Result<Step> + Send + Sync;

/// Directory relative paths in step parameters are resolved against.
///
/// Attach one to the execution context; without it the process working
/// directory is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDir(pub PathBuf);

struct Registration {
    description: &'static str,
    factory: Arc<StepFactory>,
}

/// Maps step type names to factories.
///
/// Constructed explicitly and passed to whatever needs lookups; there is no
/// process-wide registry.
#[derive(Default)]
pub struct StepRegistry {
    types: BTreeMap<String, Registration>,
}

impl fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StepRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in step type.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register("shell", "Run a shell command", shell::build)
            .register("file.read", "Read a text or JSON file", file::build_read)
            .register("file.write", "Write input or content to a file", file::build_write)
            .register("csv.write", "Write an array of objects as CSV", file::build_csv)
            .register("http", "Make an HTTP request", http::build)
            .register("git", "Run a git command", git::build)
            .register("transform.merge", "Merge params into the input object", transform::build_merge)
            .register("echo", "Pass input through unchanged", transform::build_echo);
        registry
    }

    /// Register a step type, replacing any previous registration.
    pub fn register<F>(&mut self, type_name: &str, description: &'static str, factory: F) -> &mut Self
    where
        F: Fn(&str, &Value) -> Result<Step> + Send + Sync + 'static,
    {
        self.types.insert(
            type_name.to_string(),
            Registration {
                description,
                factory: Arc::new(factory),
            },
        );
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Registered type names with descriptions, sorted by name.
    pub fn types(&self) -> Vec<(&str, &str)> {
        self.types
            .iter()
            .map(|(name, reg)| (name.as_str(), reg.description))
            .collect()
    }

    /// Build a step of the given type.
    pub fn create(&self, type_name: &str, name: &str, params: &Value) -> Result<Step> {
        let registration = self
            .types
            .get(type_name)
            .ok_or_else(|| StepwiseError::UnknownStepType {
                name: type_name.to_string(),
            })?;
        (registration.factory)(name, params)
    }
}

/// Ensure `params` is an object (or absent) and has the given keys.
pub(crate) fn require_params(step: &str, type_name: &str, params: &Value, keys: &[&str]) -> Result<()> {
    let invalid = |message: String| StepwiseError::ConfigValidationError { message };

    let empty = serde_json::Map::new();
    let map = match params {
        Value::Null => &empty,
        Value::Object(map) => map,
        _ => {
            return Err(invalid(format!(
                "Step '{}' ({}) params must be a mapping",
                step, type_name
            )))
        }
    };

    for key in keys {
        if !map.contains_key(*key) {
            return Err(invalid(format!(
                "Step '{}' ({}) requires param '{}'",
                step, type_name, key
            )));
        }
    }
    Ok(())
}

/// Interpolate raw params against the step input and deserialize them.
pub(crate) fn resolve_params<T: DeserializeOwned>(
    raw: &Value,
    input: &Value,
    ctx: &ExecutionContext,
) -> anyhow::Result<T> {
    let raw = if raw.is_null() {
        Value::Object(Default::default())
    } else {
        raw.clone()
    };
    let interpolation = InterpolationContext::new(input, ctx.metadata());
    let resolved = resolve_value(&raw, &interpolation)?;
    serde_json::from_value(resolved).context("Invalid step params")
}

/// Resolve a possibly relative path against the context's working directory.
pub(crate) fn resolve_path(ctx: &ExecutionContext, path: &str) -> PathBuf {
    let path = Path::new(path);
    match ctx.attachments().get::<WorkingDir>() {
        Some(WorkingDir(root)) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn builtin_registers_every_type() {
        let registry = StepRegistry::builtin();
        for name in [
            "shell",
            "file.read",
            "file.write",
            "csv.write",
            "http",
            "git",
            "transform.merge",
            "echo",
        ] {
            assert!(registry.contains(name), "missing {}", name);
        }
        let names: Vec<_> = registry.types().into_iter().map(|(n, _)| n).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let err = StepRegistry::builtin()
            .create("ftp", "upload", &Value::Null)
            .unwrap_err();
        assert!(matches!(err, StepwiseError::UnknownStepType { ref name } if name == "ftp"));
    }

    #[tokio::test]
    async fn custom_types_can_be_registered() {
        let mut registry = StepRegistry::new();
        registry.register("constant", "Return params.value", |name, params| {
            let value = params["value"].clone();
            Ok(Step::from_fn(name, move |_input, _ctx| {
                let value = value.clone();
                async move { Ok(value) }
            }))
        });

        let step = registry
            .create("constant", "answer", &json!({"value": 42}))
            .unwrap();
        let result = step.execute(Value::Null, &ExecutionContext::new()).await;
        assert_eq!(step.name(), "answer");
        assert_eq!(result.data, Some(json!(42)));
    }

    #[test]
    fn require_params_reports_missing_key() {
        let err = require_params("build", "shell", &json!({"cwd": "."}), &["command"]).unwrap_err();
        assert!(err.to_string().contains("requires param 'command'"));

        let err = require_params("build", "shell", &json!("echo"), &[]).unwrap_err();
        assert!(err.to_string().contains("must be a mapping"));

        assert!(require_params("noop", "echo", &Value::Null, &[]).is_ok());

        let err = require_params("build", "shell", &Value::Null, &["command"]).unwrap_err();
        assert!(err.to_string().contains("requires param 'command'"));
    }

    #[test]
    fn resolve_params_interpolates_input() {
        #[derive(Deserialize)]
        struct Params {
            greeting: String,
        }

        let params: Params = resolve_params(
            &json!({"greeting": "hello ${input.who}"}),
            &json!({"who": "ci"}),
            &ExecutionContext::new(),
        )
        .unwrap();
        assert_eq!(params.greeting, "hello ci");
    }

    #[test]
    fn resolve_path_uses_working_dir() {
        let ctx = ExecutionContext::new().attach(WorkingDir(PathBuf::from("/srv/app")));
        assert_eq!(resolve_path(&ctx, "out.txt"), PathBuf::from("/srv/app/out.txt"));
        assert_eq!(resolve_path(&ctx, "/tmp/x"), PathBuf::from("/tmp/x"));
        assert_eq!(
            resolve_path(&ExecutionContext::new(), "out.txt"),
            PathBuf::from("out.txt")
        );
    }
}
