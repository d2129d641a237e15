//! Captured log entries

use serde::{Deserialize, Serialize};

use crate::cdp::{RemoteValue, StackTrace};

/// Raw payload kept for error and warning entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub args: Vec<RemoteValue>,
    /// Absent when the target sent no stack with the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<StackTrace>,
}

/// One console call captured from the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Severity as reported by the target (`log`, `warning`, `error`, `info`, `debug`, ...)
    pub level: String,
    /// Rendered arguments
    pub text: String,
    /// Capture time, epoch milliseconds
    pub timestamp: i64,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

impl LogEntry {
    pub fn is_error(&self) -> bool {
        self.level == "error"
    }

    pub fn is_warning(&self) -> bool {
        self.level == "warning"
    }

    pub fn args(&self) -> Option<&[RemoteValue]> {
        self.diagnostics.as_ref().map(|d| d.args.as_slice())
    }

    pub fn stack_trace(&self) -> Option<&StackTrace> {
        self.diagnostics.as_ref().and_then(|d| d.stack_trace.as_ref())
    }
}

/// Whether entries of this severity keep their raw arguments and stack trace
pub fn keeps_diagnostics(level: &str) -> bool {
    matches!(level, "error" | "warning")
}

/// Assemble an entry stamped with the current time
pub fn build_entry(
    level: String,
    text: String,
    args: Vec<RemoteValue>,
    stack_trace: Option<StackTrace>,
) -> LogEntry {
    build_entry_at(level, text, args, stack_trace, chrono::Utc::now().timestamp_millis())
}

/// Assemble an entry with an explicit timestamp
pub fn build_entry_at(
    level: String,
    text: String,
    args: Vec<RemoteValue>,
    stack_trace: Option<StackTrace>,
    timestamp: i64,
) -> LogEntry {
    let diagnostics = keeps_diagnostics(&level).then(|| Diagnostics { args, stack_trace });
    LogEntry {
        level,
        text,
        timestamp,
        diagnostics,
    }
}
