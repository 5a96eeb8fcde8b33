//! Shared display helpers for run results.

use serde_json::Value;

use crate::runner::RunResult;
use crate::steps::format_duration;
use crate::ui::{Table, UserInterface};

/// Print one workflow run: a header, one line per step, and a summary.
pub fn show_run_result(ui: &mut dyn UserInterface, result: &RunResult) {
    ui.show_header(&result.workflow);
    for step in &result.steps {
        ui.show_step(step);
    }

    let summary = result.summary_line();
    // the UI adds its own status glyph
    let text = summary
        .strip_prefix("✓ ")
        .or_else(|| summary.strip_prefix("✗ "))
        .unwrap_or(&summary);
    if result.success {
        ui.success(text);
    } else {
        ui.error(text);
    }
}

/// Summary table for several runs.
pub fn results_table(results: &[RunResult]) -> Table {
    let mut table = Table::new(vec!["Workflow", "Status", "Steps", "Duration"]);
    for result in results {
        let status = if result.success { "✓" } else { "✗" };
        let passed = result.steps.iter().filter(|s| s.success).count();
        table.add_row(&[
            result.workflow.clone(),
            status.to_string(),
            format!("{}/{}", passed, result.steps.len()),
            format_duration(result.duration),
        ]);
    }
    table
}

/// Render JSON for machine-readable output.
pub fn print_json(ui: &mut dyn UserInterface, value: &Value) {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    ui.print_raw(&rendered);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{StepError, StepResult};
    use crate::ui::MockUI;
    use chrono::Utc;
    use serde_json::json;
    use std::time::Duration;

    fn run(workflow: &str, success: bool) -> RunResult {
        let step = if success {
            StepResult::success("only", json!(1), Duration::from_millis(4))
        } else {
            StepResult::failure("only", StepError::execution("boom"), Duration::from_millis(4))
        };
        RunResult {
            workflow: workflow.to_string(),
            success,
            data: success.then(|| json!(1)),
            error: step.error.clone(),
            duration: Duration::from_millis(5),
            steps: vec![step],
            started_at: Utc::now(),
        }
    }

    #[test]
    fn shows_successful_run() {
        let mut ui = MockUI::new();
        show_run_result(&mut ui, &run("report", true));

        assert_eq!(ui.headers(), ["report"]);
        assert_eq!(ui.steps(), ["✓ only (4ms)"]);
        assert!(ui.has_success("report completed in 5ms"));
    }

    #[test]
    fn shows_failed_run() {
        let mut ui = MockUI::new();
        show_run_result(&mut ui, &run("report", false));

        assert!(ui.has_error("report failed after 5ms: boom"));
        assert!(!ui.errors()[0].starts_with('✗'));
    }

    #[test]
    fn table_has_row_per_run() {
        let table = results_table(&[run("a", true), run("b", false)]);
        assert_eq!(table.row_count(), 2);
        let rendered = table.render();
        assert!(rendered.contains("1/1"));
        assert!(rendered.contains("0/1"));
    }

    #[test]
    fn json_is_printed_raw() {
        let mut ui = MockUI::new();
        print_json(&mut ui, &json!({"ok": true}));
        let parsed: Value = serde_json::from_str(&ui.raw()[0]).unwrap();
        assert_eq!(parsed, json!({"ok": true}));
    }
}
