//! Operator-facing text for captured entries

use metrolog_core::LogEntry;

/// Shown when a capture returns nothing
pub const NO_LOGS_MESSAGE: &str = "No logs received";

fn prefix(level: &str) -> &'static str {
    match level {
        "error" => "❌ ERROR: ",
        "warning" => "⚠️  WARNING: ",
        _ => "",
    }
}

/// One entry, with the top stack frame appended for errors and warnings
pub fn render_entry(entry: &LogEntry) -> String {
    let mut out = format!("{}{}", prefix(&entry.level), entry.text);

    if entry.is_error() || entry.is_warning() {
        if let Some(frame) = entry.stack_trace().and_then(|t| t.top_frame()) {
            out.push_str(&format!(
                "\n  at {} (line {})",
                frame.display_name(),
                frame.line_number
            ));
        }
    }

    out
}

/// All entries, one per line. `None` when there is nothing to show.
pub fn render_entries(entries: &[LogEntry]) -> Option<String> {
    if entries.is_empty() {
        return None;
    }
    Some(
        entries
            .iter()
            .map(render_entry)
            .collect::<Vec<_>>()
            .join("\n"),
    )
}
