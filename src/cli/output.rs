//! Output formatting utilities for the CLI.

use std::time::Duration;

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// A command result that prints as text or JSON.
pub trait CommandOutput: Serialize {
    /// Text for a terminal.
    fn to_human(&self) -> String;
    /// Value printed under `--json`.
    fn to_json(&self) -> serde_json::Value;
}

/// Print `result` in the chosen form.
pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Print an error and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": causes,
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err}", style("error:").red().bold());
        for cause in err.chain().skip(1) {
            eprintln!("  {} {cause}", style("caused by:").dim());
        }
    }
    std::process::exit(1)
}

/// Truncate a string to at most `max_len` characters, appending "..." if cut.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Spinner for a long-running operation. Draws to stderr.
pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template(SPINNER_TEMPLATE)
        .map_or_else(|_| ProgressStyle::default_spinner(), |s| s.tick_chars(SPINNER_CHARS));
    spinner.set_style(style);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Borderless table with upper-cased headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Colour a run or stage status.
pub fn style_status(status: &str) -> StyledObject<&str> {
    match status {
        "completed" | "passed" => style(status).green().bold(),
        "cost_exceeded" | "escalated" => style(status).yellow().bold(),
        "error" | "failed" => style(status).red().bold(),
        "derived" => style(status).cyan(),
        _ => style(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer sentence", 10), "a longe...");
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn test_list_table_headers() {
        let mut table = list_table(&["stage", "status"]);
        table.add_row(vec!["discovery", "passed"]);
        let rendered = table.to_string();
        assert!(rendered.contains("STAGE"));
        assert!(rendered.contains("discovery"));
    }
}
