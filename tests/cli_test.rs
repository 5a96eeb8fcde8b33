//! Integration tests for the stepwise binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn setup_project(config: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join(".stepwise");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.yml"), config).unwrap();
    temp
}

const SIMPLE_CONFIG: &str = r#"
app_name: Test
workflows:
  tag:
    description: "Tag the input"
    steps:
      - name: label
        type: transform.merge
        params: {tagged: true}
  strict:
    input_schema: {type: object, required: [id]}
    steps:
      - name: pass
        type: echo
"#;

fn stepwise(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(cargo_bin("stepwise"));
    cmd.current_dir(dir).env("NO_COLOR", "1");
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("stepwise"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_DESCRIPTION")));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("stepwise"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_run_workflow() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(SIMPLE_CONFIG);
    stepwise(temp.path())
        .args(["run", "tag", "--input", "{}"])
        .assert()
        .success()
        .stdout(predicate::str::contains("label"))
        .stdout(predicate::str::contains("tag completed"));
    Ok(())
}

#[test]
fn cli_run_json_output() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(SIMPLE_CONFIG);
    let output = stepwise(temp.path())
        .args(["--json", "run", "tag", "--input", r#"{"id": 7}"#])
        .output()?;

    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["workflow"], "tag");
    assert_eq!(json["data"]["id"], 7);
    assert_eq!(json["data"]["tagged"], true);
    Ok(())
}

#[test]
fn cli_run_failed_workflow_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(SIMPLE_CONFIG);
    stepwise(temp.path())
        .args(["run", "strict", "--input", "{}"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("strict failed"));
    Ok(())
}

#[test]
fn cli_run_unknown_workflow_exits_one() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(SIMPLE_CONFIG);
    stepwise(temp.path())
        .args(["run", "ghost"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ghost"));
    Ok(())
}

#[test]
fn cli_run_no_config_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    stepwise(temp.path())
        .args(["run", "tag"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No configuration found"));
    Ok(())
}

#[test]
fn cli_run_with_explicit_config() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let path = temp.path().join("pipeline.yml");
    fs::write(&path, SIMPLE_CONFIG)?;
    stepwise(temp.path())
        .args(["--config", path.to_str().unwrap(), "run", "tag"])
        .assert()
        .success();
    Ok(())
}

#[test]
fn cli_step_runs_without_config() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    stepwise(temp.path())
        .args(["--json", "step", "echo", "--input", "[1, 2]"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": true"));
    Ok(())
}

#[test]
fn cli_step_writes_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    stepwise(temp.path())
        .args([
            "step",
            "file.write",
            "--params",
            r#"{"path": "out.json"}"#,
            "--input",
            r#"{"ok": true}"#,
        ])
        .assert()
        .success();
    let written: Value = serde_json::from_str(&fs::read_to_string(temp.path().join("out.json"))?)?;
    assert_eq!(written["ok"], true);
    Ok(())
}

#[test]
fn cli_list_json() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(SIMPLE_CONFIG);
    let output = stepwise(temp.path()).args(["--json", "list"]).output()?;

    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["workflows"][1]["id"], "tag");
    assert_eq!(json["workflows"][1]["description"], "Tag the input");
    assert!(json["step_types"].as_array().unwrap().len() >= 8);
    Ok(())
}

#[test]
fn cli_list_shows_workflows() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(SIMPLE_CONFIG);
    stepwise(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workflows:"))
        .stdout(predicate::str::contains("Step types:"));
    Ok(())
}

#[test]
fn cli_completions() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("stepwise"));
    cmd.args(["completions", "bash"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("stepwise"));
    Ok(())
}

#[test]
fn cli_invalid_command_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("stepwise"));
    cmd.arg("invalid-command");
    cmd.assert().failure();
    Ok(())
}

#[test]
fn cli_debug_enables_logging() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("stepwise"));
    cmd.args(["--debug", "--help"]);
    cmd.assert().success();
    Ok(())
}
