//! Terminal UI.

use console::Term;
use std::io::Write;

use crate::steps::StepResult;

use super::{OutputMode, StepwiseTheme, UserInterface};

/// Terminal UI implementation.
///
/// Status output goes to stdout, errors to stderr.
pub struct TerminalUI {
    out: Term,
    err: Term,
    theme: StepwiseTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode) -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            theme: StepwiseTheme::detect(),
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn set_output_mode(&mut self, mode: OutputMode) {
        self.mode = mode;
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.err, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn show_step(&mut self, result: &StepResult) {
        if !self.mode.shows_steps() {
            return;
        }
        writeln!(self.out, "  {}", self.theme.format_step(result)).ok();
        if self.mode.shows_step_data() {
            if let Some(data) = &result.data {
                let rendered = serde_json::to_string_pretty(data).unwrap_or_default();
                for line in rendered.lines() {
                    writeln!(self.out, "      {}", self.theme.dim.apply_to(line)).ok();
                }
            }
        }
    }

    fn print_raw(&mut self, text: &str) {
        writeln!(self.out, "{}", text).ok();
    }

    fn theme(&self) -> &StepwiseTheme {
        &self.theme
    }
}

/// Create the UI for the given output mode.
pub fn create_ui(mode: OutputMode) -> Box<dyn UserInterface> {
    Box::new(TerminalUI::new(mode))
}
