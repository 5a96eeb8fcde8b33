//! Table rendering for formatted output.

use console::measure_text_width;

/// A simple box-drawn table.
///
/// Column widths are measured in terminal cells, so styled cells and
/// symbols like `✓` line up.
#[derive(Debug)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    column_widths: Vec<usize>,
}

impl Table {
    /// Create a new table with the given headers.
    pub fn new(headers: Vec<&str>) -> Self {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        let column_widths = headers.iter().map(|h| measure_text_width(h)).collect();

        Self {
            headers,
            rows: Vec::new(),
            column_widths,
        }
    }

    /// Add a row to the table. Cells beyond the header count are dropped.
    pub fn add_row<S: AsRef<str>>(&mut self, row: &[S]) {
        let row: Vec<String> = row
            .iter()
            .take(self.headers.len())
            .map(|s| s.as_ref().to_string())
            .collect();

        for (width, cell) in self.column_widths.iter_mut().zip(&row) {
            *width = (*width).max(measure_text_width(cell));
        }

        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the table as a string.
    pub fn render(&self) -> String {
        let mut lines = vec![
            self.render_border('┌', '┬', '┐'),
            self.render_row(&self.headers),
            self.render_border('├', '┼', '┤'),
        ];
        lines.extend(self.rows.iter().map(|row| self.render_row(row)));
        lines.push(self.render_border('└', '┴', '┘'));
        lines.join("\n")
    }

    fn render_border(&self, left: char, mid: char, right: char) -> String {
        let segments: Vec<String> = self
            .column_widths
            .iter()
            .map(|width| "─".repeat(width + 2))
            .collect();
        format!("{}{}{}", left, segments.join(&mid.to_string()), right)
    }

    fn render_row(&self, row: &[String]) -> String {
        let mut s = String::from("│");

        for (i, width) in self.column_widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            let padding = width.saturating_sub(measure_text_width(cell));
            s.push_str(&format!(" {}{} │", cell, " ".repeat(padding)));
        }

        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_empty() {
        let table = Table::new(vec!["A", "B"]);
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);

        let output = table.render();
        assert!(output.contains("A"));
        assert!(output.contains("B"));
    }

    #[test]
    fn table_with_rows() {
        let mut table = Table::new(vec!["Step", "Status"]);
        table.add_row(&["fetch", "✓"]);
        table.add_row(&["save", "✗"]);

        assert_eq!(table.row_count(), 2);

        let output = table.render();
        assert!(output.contains("fetch"));
        assert!(output.contains("save"));
    }

    #[test]
    fn table_aligns_wide_symbols() {
        let mut table = Table::new(vec!["Status", "Step"]);
        table.add_row(&["✓", "fetch"]);

        let output = table.render();
        let widths: Vec<_> = output.lines().map(measure_text_width).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn table_handles_missing_cells() {
        let mut table = Table::new(vec!["A", "B", "C"]);
        table.add_row(&["only", "two"]);

        let output = table.render();
        assert!(output.contains("only"));
        assert!(output.contains("two"));
    }

    #[test]
    fn table_render_line_count() {
        let mut table = Table::new(vec!["Workflow", "Duration", "Status"]);
        table.add_row(&["build", "1.2s", "✓"]);
        table.add_row(&["test", "45.3s", "✓"]);
        table.add_row(&["deploy", "5.0s", "✗"]);

        let output = table.render();
        // top border, header, separator, 3 rows, bottom border
        assert_eq!(output.lines().count(), 7);
        assert!(output.contains("┬"));
        assert!(output.contains("┼"));
        assert!(output.contains("┴"));
    }
}
