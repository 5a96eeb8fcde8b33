//! `shell` step: run a command through the user's shell.
//!
//! Params: `command` (required), `args`, `cwd`, `env`, `timeout` (seconds),
//! `allow_failure`. Output: `{stdout, stderr, exit_code}`.
//!
//! Without `args`, `command` is interpolated and handed to `sh -c` as one
//! string, so `${input.*}` values are parsed by the shell. With `args`,
//! `command` is the program and each entry is one argument passed as-is;
//! use this form for values that come from step input.

use std::collections::HashMap;

use anyhow::bail;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{require_params, resolve_params, resolve_path};
use crate::error::Result;
use crate::shell::{self, CommandOptions};
use crate::steps::{ExecutionContext, Step, StepHandler};

#[derive(Debug, Deserialize)]
struct ShellParams {
    command: String,
    #[serde(default)]
    args: Option<Vec<Value>>,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    timeout: Option<u64>,
    #[serde(default)]
    allow_failure: bool,
}

struct ShellStep {
    params: Value,
}

#[async_trait]
impl StepHandler for ShellStep {
    async fn run(&self, input: Value, ctx: &ExecutionContext) -> anyhow::Result<Value> {
        let params: ShellParams = resolve_params(&self.params, &input, ctx)?;

        let cwd = match &params.cwd {
            Some(dir) => Some(resolve_path(ctx, dir)),
            None => ctx
                .attachments()
                .get::<super::WorkingDir>()
                .map(|dir| dir.0.clone()),
        };
        let options = CommandOptions {
            cwd,
            env: params.env,
            timeout: params.timeout,
            ..CommandOptions::captured()
        };

        let result = match &params.args {
            Some(args) => {
                let args: Vec<String> = args.iter().map(arg_text).collect();
                debug!(program = %params.command, ?args, "Running program");
                shell::execute_program(&params.command, &args, &options).await?
            }
            None => {
                debug!(command = %params.command, "Running shell command");
                shell::execute(&params.command, &options).await?
            }
        };

        if !result.success && !params.allow_failure {
            let stderr = result.stderr.trim();
            match result.exit_code {
                Some(code) if stderr.is_empty() => {
                    bail!("Command `{}` exited with code {}", params.command, code)
                }
                Some(code) => bail!(
                    "Command `{}` exited with code {}: {}",
                    params.command,
                    code,
                    stderr
                ),
                None => bail!("Command `{}` was terminated", params.command),
            }
        }

        Ok(json!({
            "stdout": result.stdout,
            "stderr": result.stderr,
            "exit_code": result.exit_code,
        }))
    }
}

fn arg_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(crate) fn build(name: &str, params: &Value) -> Result<Step> {
    require_params(name, "shell", params, &["command"])?;
    Ok(Step::new(
        name,
        ShellStep {
            params: params.clone(),
        },
    ))
}
