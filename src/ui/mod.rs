//! Terminal output for the CLI.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for real terminal output
//! - [`MockUI`] for asserting on output in tests
//! - [`Table`] and [`StepwiseTheme`] for formatting
//!
//! # Example
//!
//! ```
//! use stepwise::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.show_header("reports");
//! ui.success("Done");
//! assert!(ui.has_success("Done"));
//! ```

pub mod mock;
pub mod output;
pub mod table;
pub mod terminal;
pub mod theme;

pub use mock::MockUI;
pub use output::OutputMode;
pub use table::Table;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, StepwiseTheme};

use crate::steps::StepResult;

/// Trait for user-facing output.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Change the output mode.
    fn set_output_mode(&mut self, mode: OutputMode);

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message. Shown in every output mode.
    fn error(&mut self, msg: &str);

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// Show the outcome of one step.
    fn show_step(&mut self, result: &StepResult);

    /// Print machine-readable output regardless of output mode.
    fn print_raw(&mut self, text: &str);

    /// Theme used for styling.
    fn theme(&self) -> &StepwiseTheme;
}
