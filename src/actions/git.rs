//! `git` step: run a git command.
//!
//! Either raw `args`, or an `action` with its fields:
//!
//! - `status` - porcelain status; output gains a `changes` list
//! - `add` - `paths` (default `["."]`)
//! - `commit` - `message` (required), `all`
//! - `push` - optional `remote` and `branch`
//!
//! Output: `{stdout, stderr, exit_code}`.

use anyhow::bail;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{require_params, resolve_params, resolve_path, WorkingDir};
use crate::error::{Result, StepwiseError};
use crate::shell::{execute_program, CommandOptions};
use crate::steps::{ExecutionContext, Step, StepHandler};

#[derive(Debug, Default, Deserialize)]
struct GitParams {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    paths: Vec<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    all: bool,
    #[serde(default)]
    remote: Option<String>,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    cwd: Option<String>,
}

impl GitParams {
    fn command_args(&self) -> anyhow::Result<Vec<String>> {
        let action = match self.action.as_deref() {
            None if self.args.is_empty() => bail!("git step needs `action` or `args`"),
            None => return Ok(self.args.clone()),
            Some(action) => action,
        };

        let mut args = vec![action.to_string()];
        match action {
            "status" => args.push("--porcelain".to_string()),
            "add" => {
                if self.paths.is_empty() {
                    args.push(".".to_string());
                } else {
                    args.extend(self.paths.iter().cloned());
                }
            }
            "commit" => {
                let Some(message) = self.message.as_deref().filter(|m| !m.is_empty()) else {
                    bail!("git commit needs a `message`");
                };
                if self.all {
                    args.push("--all".to_string());
                }
                args.push("-m".to_string());
                args.push(message.to_string());
            }
            "push" => {
                args.extend(self.remote.iter().cloned());
                args.extend(self.branch.iter().cloned());
            }
            other => bail!("Unknown git action '{}'", other),
        }
        args.extend(self.args.iter().cloned());
        Ok(args)
    }
}

/// Parse `git status --porcelain` output into `{status, path}` entries.
fn parse_porcelain(stdout: &str) -> Vec<Value> {
    stdout
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let (status, path) = line.split_at(2);
            json!({ "status": status.trim(), "path": path.trim() })
        })
        .collect()
}

struct GitStep {
    params: Value,
}

#[async_trait]
impl StepHandler for GitStep {
    async fn run(&self, input: Value, ctx: &ExecutionContext) -> anyhow::Result<Value> {
        let params: GitParams = resolve_params(&self.params, &input, ctx)?;
        let args = params.command_args()?;

        let cwd = match &params.cwd {
            Some(dir) => Some(resolve_path(ctx, dir)),
            None => ctx.attachments().get::<WorkingDir>().map(|d| d.0.clone()),
        };
        let options = CommandOptions {
            cwd,
            ..CommandOptions::captured()
        };

        debug!(args = ?args, "Running git");
        let result = execute_program("git", &args, &options).await?;

        if !result.success {
            bail!(
                "git {} failed: {}",
                args.first().map(String::as_str).unwrap_or_default(),
                result.stderr.trim()
            );
        }

        let mut output = json!({
            "stdout": result.stdout,
            "stderr": result.stderr,
            "exit_code": result.exit_code,
        });
        if params.action.as_deref() == Some("status") {
            output["changes"] = Value::Array(parse_porcelain(&result.stdout));
        }
        Ok(output)
    }
}

pub(crate) fn build(name: &str, params: &Value) -> Result<Step> {
    require_params(name, "git", params, &[])?;
    if params.get("action").is_none() && params.get("args").is_none() {
        return Err(StepwiseError::ConfigValidationError {
            message: format!("Step '{}' (git) requires param 'action' or 'args'", name),
        });
    }
    Ok(Step::new(
        name,
        GitStep {
            params: params.clone(),
        },
    ))
}
