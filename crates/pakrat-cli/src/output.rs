//! Output formatting utilities for the CLI

use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets};
use owo_colors::OwoColorize;

/// Style configuration for output formatting
pub struct OutputStyle {
    /// Whether to use colors in output
    pub use_color: bool,
    /// Whether to use Unicode characters for borders
    pub use_unicode: bool,
}

impl Default for OutputStyle {
    fn default() -> Self {
        Self {
            use_color: std::env::var("NO_COLOR").is_err(),
            use_unicode: true,
        }
    }
}

impl OutputStyle {
    /// Create a new output style
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors in output
    #[must_use]
    pub fn no_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

/// Format a header with appropriate styling
pub fn format_header(text: &str, style: &OutputStyle) -> String {
    if style.use_color {
        text.bold().bright_blue().to_string()
    } else {
        text.to_string()
    }
}

/// Format a success message
pub fn format_success(text: &str, style: &OutputStyle) -> String {
    if style.use_color {
        text.green().to_string()
    } else {
        text.to_string()
    }
}

/// Format a warning message
pub fn format_warning(text: &str, style: &OutputStyle) -> String {
    if style.use_color {
        text.yellow().to_string()
    } else {
        text.to_string()
    }
}

/// Create a styled table
pub fn create_table(style: &OutputStyle) -> Table {
    let mut table = Table::new();

    if style.use_unicode {
        table
            .load_preset(presets::UTF8_FULL)
            .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    } else {
        table.load_preset(presets::ASCII_FULL);
    }

    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);

    table
}

/// Create a header cell
pub fn header_cell(text: &str, style: &OutputStyle) -> Cell {
    let cell = Cell::new(text);
    if style.use_color {
        cell.add_attribute(Attribute::Bold)
    } else {
        cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_style_leaves_text_alone() {
        let style = OutputStyle::new().no_color();
        assert_eq!(format_header("Files", &style), "Files");
        assert_eq!(format_warning("partial", &style), "partial");
    }

    #[test]
    fn test_table_renders_rows() {
        let style = OutputStyle::new().no_color();
        let mut table = create_table(&style);
        table.set_header(vec![header_cell("Filename", &style)]);
        table.add_row(vec!["maps/e1m1.bsp"]);
        let rendered = table.to_string();
        assert!(rendered.contains("Filename"));
        assert!(rendered.contains("maps/e1m1.bsp"));
    }
}
