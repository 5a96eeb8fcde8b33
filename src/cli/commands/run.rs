//! Run command implementation.
//!
//! The `stepwise run` command executes one or more configured workflows.
//! Several workflows run in order, each receiving the previous one's output,
//! unless `--parallel` is given.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::actions::{StepRegistry, WorkingDir};
use crate::cli::args::RunArgs;
use crate::config::build_runner;
use crate::error::Result;
use crate::runner::RunConfig;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandContext, CommandResult, EXIT_NO_CONFIG};
use super::display::{print_json, results_table, show_run_result};
use super::input::{load_project_config, parse_metadata, read_input};

/// The run command implementation.
pub struct RunCommand {
    context: CommandContext,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(context: CommandContext, args: RunArgs) -> Self {
        Self { context, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    /// One run config per requested workflow.
    ///
    /// Sequential runs give the input to the first workflow only; the rest
    /// chain. Parallel runs give every workflow the same input.
    fn run_configs(&self, input: Option<Value>) -> Result<Vec<RunConfig>> {
        let metadata = parse_metadata(&self.args.metadata)?;

        Ok(self
            .args
            .workflows
            .iter()
            .enumerate()
            .map(|(index, workflow)| {
                let mut config = RunConfig::new(workflow).with_metadata(metadata.clone());
                if let Some(input) = &input {
                    if self.args.parallel || index == 0 {
                        config = config.with_input(input.clone());
                    }
                }
                config
            })
            .collect())
    }
}

#[async_trait(?Send)]
impl Command for RunCommand {
    async fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(config) = load_project_config(&self.context, ui)? else {
            return Ok(CommandResult::failure(EXIT_NO_CONFIG));
        };

        let registry = StepRegistry::builtin();
        let mut runner = build_runner(&config, &registry)?;
        runner.attach(WorkingDir(self.context.project_root.clone()));

        let input = read_input(&self.args.input)?;
        let configs = self.run_configs(input)?;
        debug!(
            workflows = ?self.args.workflows,
            parallel = self.args.parallel,
            "Running workflows"
        );

        let results = if self.args.parallel {
            runner.run_workflows_parallel(&configs).await?
        } else {
            runner.run_workflows_sequential(&configs).await?
        };

        if self.context.json {
            let json: Vec<Value> = results.iter().map(|r| r.to_json()).collect();
            let value = match <[Value; 1]>::try_from(json) {
                Ok([single]) => single,
                Err(many) => Value::Array(many),
            };
            print_json(ui, &value);
        } else {
            if let Some(app) = &config.app_name {
                let line = ui.theme().dim.apply_to(app).to_string();
                ui.message(&line);
            }
            for result in &results {
                show_run_result(ui, result);
            }
            if results.len() > 1 {
                ui.message("");
                ui.message(&results_table(&results).render());
            }
        }

        Ok(CommandResult::from_success(results.iter().all(|r| r.success)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::InputArgs;
    use crate::error::StepwiseError;
    use crate::ui::MockUI;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
app_name: demo
workflows:
  tag:
    steps:
      - name: label
        type: transform.merge
        params: {tagged: true}
  stamp:
    steps:
      - name: stamp
        type: transform.merge
        params: {stamped: "${metadata.who}"}
  strict:
    input_schema: {type: object, required: [id]}
    steps:
      - name: pass
        type: echo
"#;

    fn setup_project(config: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".stepwise");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yml"), config).unwrap();
        temp
    }

    fn args(workflows: &[&str], input: Option<&str>) -> RunArgs {
        RunArgs {
            workflows: workflows.iter().map(|w| w.to_string()).collect(),
            input: InputArgs {
                input: input.map(str::to_string),
                input_file: None,
            },
            parallel: false,
            metadata: vec!["who=ci".to_string()],
        }
    }

    #[tokio::test]
    async fn runs_single_workflow() {
        let temp = setup_project(CONFIG);
        let cmd = RunCommand::new(CommandContext::new(temp.path()), args(&["tag"], Some("{}")));
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).await.unwrap();

        assert!(result.success);
        assert_eq!(ui.headers(), ["tag"]);
        assert!(ui.has_success("tag completed"));
    }

    #[tokio::test]
    async fn chains_workflows_sequentially() {
        let temp = setup_project(CONFIG);
        let context = CommandContext::new(temp.path()).with_json(true);
        let cmd = RunCommand::new(context, args(&["tag", "stamp"], Some(r#"{"id": 1}"#)));
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).await.unwrap();
        assert!(result.success);

        let json: Value = serde_json::from_str(&ui.raw()[0]).unwrap();
        assert_eq!(
            json[1]["data"],
            json!({"id": 1, "tagged": true, "stamped": "ci"})
        );
    }

    #[tokio::test]
    async fn parallel_runs_share_input() {
        let temp = setup_project(CONFIG);
        let context = CommandContext::new(temp.path()).with_json(true);
        let mut run_args = args(&["tag", "stamp"], Some(r#"{"id": 1}"#));
        run_args.parallel = true;
        let mut ui = MockUI::new();

        RunCommand::new(context, run_args).execute(&mut ui).await.unwrap();

        let json: Value = serde_json::from_str(&ui.raw()[0]).unwrap();
        assert_eq!(json[0]["data"], json!({"id": 1, "tagged": true}));
        assert_eq!(json[1]["data"], json!({"id": 1, "stamped": "ci"}));
    }

    #[tokio::test]
    async fn failed_workflow_exits_one() {
        let temp = setup_project(CONFIG);
        let cmd = RunCommand::new(CommandContext::new(temp.path()), args(&["strict"], Some("{}")));
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).await.unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("strict failed"));
    }

    #[tokio::test]
    async fn unknown_workflow_is_an_error() {
        let temp = setup_project(CONFIG);
        let cmd = RunCommand::new(CommandContext::new(temp.path()), args(&["nope"], None));
        let mut ui = MockUI::new();

        let err = cmd.execute(&mut ui).await.unwrap_err();
        assert!(matches!(err, StepwiseError::WorkflowNotFound { ref id } if id == "nope"));
    }

    #[tokio::test]
    async fn missing_config_exits_two() {
        let temp = TempDir::new().unwrap();
        let cmd = RunCommand::new(CommandContext::new(temp.path()), args(&["tag"], None));
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).await.unwrap();
        assert_eq!(result.exit_code, 2);
    }

    #[test]
    fn input_goes_to_first_workflow_when_sequential() {
        let cmd = RunCommand::new(CommandContext::new("."), args(&["a", "b"], None));
        let configs = cmd.run_configs(Some(json!(1))).unwrap();
        assert_eq!(configs[0].input, Some(json!(1)));
        assert_eq!(configs[1].input, None);
        assert_eq!(configs[1].metadata.as_ref().unwrap()["who"], json!("ci"));
    }
}
