//! Server configuration

use std::time::Duration;

use metrolog_core::{CaptureOptions, DEFAULT_CAPTURE_TIMEOUT, DEFAULT_MAX_ENTRIES};

pub const DEFAULT_METRO_HOST: &str = "localhost";
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings shared by every tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host Metro listens on; the port comes from each tool call
    pub metro_host: String,
    /// Wall-clock budget of one console capture
    pub capture_timeout: Duration,
    /// Entry cap when the caller omits `maxLogs`
    pub default_max_logs: usize,
    /// Timeout of the `/json/list` request
    pub discovery_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            metro_host: DEFAULT_METRO_HOST.to_string(),
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
            default_max_logs: DEFAULT_MAX_ENTRIES,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Capture bounds for one call
    pub fn capture_options(&self, max_logs: Option<usize>) -> CaptureOptions {
        CaptureOptions::default()
            .with_max_entries(max_logs.unwrap_or(self.default_max_logs))
            .with_timeout(self.capture_timeout)
    }
}
