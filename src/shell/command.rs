//! Shell command execution.

use crate::error::{Result, StepwiseError};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Capture stdout (if false, inherits from parent).
    pub capture_stdout: bool,

    /// Capture stderr (if false, inherits from parent).
    pub capture_stderr: bool,

    /// Timeout in seconds (None = no timeout).
    pub timeout: Option<u64>,
}

impl CommandOptions {
    /// Options that capture both streams.
    pub fn captured() -> Self {
        Self {
            capture_stdout: true,
            capture_stderr: true,
            ..Default::default()
        }
    }
}

/// Execute a command through the user's shell.
pub async fn execute(command: &str, options: &CommandOptions) -> Result<CommandResult> {
    let shell = detect_shell();
    let mut cmd = Command::new(&shell);
    cmd.arg(shell_flag(&shell)).arg(command);
    run(command, cmd, options).await
}

/// Execute a program directly with arguments, bypassing the shell.
pub async fn execute_program(
    program: &str,
    args: &[String],
    options: &CommandOptions,
) -> Result<CommandResult> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    let display = std::iter::once(program.to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");
    run(&display, cmd, options).await
}

async fn run(display: &str, mut cmd: Command, options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null());
    cmd.stdout(if options.capture_stdout {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });
    cmd.stderr(if options.capture_stderr {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });
    cmd.kill_on_drop(true);

    let child = cmd.output();
    let output = match options.timeout {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), child)
            .await
            .map_err(|_| StepwiseError::CommandTimeout {
                command: display.to_string(),
                secs,
            })?,
        None => child.await,
    }
    .map_err(|e| StepwiseError::CommandSpawn {
        command: display.to_string(),
        message: e.to_string(),
    })?;

    let duration = start.elapsed();

    let stdout = if options.capture_stdout {
        String::from_utf8_lossy(&output.stdout).to_string()
    } else {
        String::new()
    };

    let stderr = if options.capture_stderr {
        String::from_utf8_lossy(&output.stderr).to_string()
    } else {
        String::new()
    };

    Ok(CommandResult {
        exit_code: output.status.code(),
        stdout,
        stderr,
        duration,
        success: output.status.success(),
    })
}

/// Detect the current shell.
fn detect_shell() -> String {
    if cfg!(target_os = "windows") {
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    } else {
        std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
    }
}

/// Get the flag to pass commands to the shell.
///
/// Steps run non-interactively, so the login shell is used without `-i`
/// (which tries to set up job control and fails without a TTY).
fn shell_flag(_shell: &str) -> &'static str {
    if cfg!(target_os = "windows") {
        "/C"
    } else {
        "-lc"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn execute_successful_command() {
        let result = execute("echo hello", &CommandOptions::captured())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn execute_failing_command() {
        let result = execute("exit 3", &CommandOptions::captured()).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[tokio::test]
    async fn execute_with_env() {
        let mut options = CommandOptions::captured();
        options
            .env
            .insert("MY_VAR".to_string(), "my_value".to_string());

        let cmd = if cfg!(target_os = "windows") {
            "echo %MY_VAR%"
        } else {
            "echo $MY_VAR"
        };

        let result = execute(cmd, &options).await.unwrap();

        assert!(result.success);
        assert!(result.stdout.contains("my_value"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn execute_with_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "x").unwrap();
        let options = CommandOptions {
            cwd: Some(temp.path().to_path_buf()),
            ..CommandOptions::captured()
        };

        let result = execute("ls", &options).await.unwrap();

        assert!(result.success);
        assert!(result.stdout.contains("marker.txt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn execute_captures_stderr() {
        let result = execute("echo oops >&2", &CommandOptions::captured())
            .await
            .unwrap();
        assert!(result.stderr.contains("oops"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_is_reported_as_timeout() {
        let options = CommandOptions {
            timeout: Some(1),
            ..CommandOptions::captured()
        };
        let err = execute("sleep 5", &options).await.unwrap_err();
        assert!(matches!(err, StepwiseError::CommandTimeout { secs: 1, .. }));
        assert_eq!(err.to_string(), "Command timed out after 1s: sleep 5");
    }

    #[tokio::test]
    async fn execute_program_reports_missing_binary() {
        let err = execute_program(
            "definitely-not-a-real-binary-xyz",
            &[],
            &CommandOptions::captured(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StepwiseError::CommandSpawn { .. }));
        let message = err.to_string();
        assert!(message.contains("definitely-not-a-real-binary-xyz"));
        assert!(!message.contains("None"));
    }

    #[test]
    fn shell_flag_is_non_interactive() {
        if !cfg!(target_os = "windows") {
            assert_eq!(shell_flag("/bin/bash"), "-lc");
        }
    }
}
