//! Shared types for metrolog

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default cap on entries returned by one capture
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Default wall-clock budget of one capture
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait for the peer to confirm a close we initiated
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// The capture input: one debuggable JavaScript context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugTarget {
    /// Target identifier assigned by Metro
    pub id: String,
    /// Human description (usually the app bundle ID)
    pub description: String,
    /// WebSocket endpoint of the target's debugger
    pub web_socket_debugger_url: String,
}

/// Capture bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Stop once this many entries are collected (must be at least 1)
    pub max_entries: usize,
    /// Stop once this much time has passed since the connect started
    pub timeout: Duration,
    /// Upper bound on waiting for close confirmation after we close
    pub close_grace: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            timeout: DEFAULT_CAPTURE_TIMEOUT,
            close_grace: DEFAULT_CLOSE_GRACE,
        }
    }
}

impl CaptureOptions {
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
