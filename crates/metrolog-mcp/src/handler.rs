//! Tool execution
//!
//! Validates tool arguments and calls into metrolog-core. Failures never
//! escape as RPC errors; they become `isError` tool results.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};

use metrolog_core::{capture, discover_targets, metro_origin, DebugTarget};

use crate::config::ServerConfig;
use crate::render::{render_entries, NO_LOGS_MESSAGE};
use crate::server::ToolHandler;
use crate::tools::{ToolResult, GET_CONNECTED_APPS, READ_CONSOLE_LOGS_FROM_APP};

pub const NO_CONNECTED_APPS_MESSAGE: &str =
    "No connected apps found, please ensure that Metro is running";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetConnectedAppsArgs {
    metro_server_port: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadConsoleLogsArgs {
    app: DebugTarget,
    #[serde(default)]
    max_logs: Option<f64>,
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments: Value) -> Result<T, String> {
    serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments: {}", e))
}

fn parse_port(value: f64) -> Result<u16, String> {
    if value.is_finite() && value.fract() == 0.0 && (1.0..=65535.0).contains(&value) {
        Ok(value as u16)
    } else {
        Err(format!("metroServerPort must be a port number, got {}", value))
    }
}

fn parse_max_logs(value: Option<f64>) -> Result<Option<usize>, String> {
    match value {
        None => Ok(None),
        Some(v) if v.is_finite() && v >= 1.0 => Ok(Some(v.floor() as usize)),
        Some(v) => Err(format!("maxLogs must be at least 1, got {}", v)),
    }
}

/// Handles `getConnectedApps` and `readConsoleLogsFromApp`
pub struct MetroToolHandler {
    config: ServerConfig,
}

impl MetroToolHandler {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    async fn get_connected_apps(&self, arguments: Value) -> Result<ToolResult, String> {
        let args: GetConnectedAppsArgs = parse_args(arguments)?;
        let port = parse_port(args.metro_server_port)?;
        let origin = metro_origin(&self.config.metro_host, port);

        let apps = discover_targets(&origin, self.config.discovery_timeout)
            .await
            .map_err(|e| e.to_string())?;

        if apps.is_empty() {
            return Err(NO_CONNECTED_APPS_MESSAGE.to_string());
        }

        let texts = apps
            .iter()
            .map(serde_json::to_string_pretty)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;
        Ok(ToolResult::texts(texts))
    }

    async fn read_console_logs(&self, arguments: Value) -> Result<ToolResult, String> {
        let args: ReadConsoleLogsArgs = parse_args(arguments)?;
        let max_logs = parse_max_logs(args.max_logs)?;
        let options = self.config.capture_options(max_logs);

        info!(
            app = %args.app.id,
            max_entries = options.max_entries,
            "Reading console logs"
        );
        let entries = capture(&args.app, options).await.map_err(|e| e.to_string())?;
        debug!(app = %args.app.id, entries = entries.len(), "Console capture done");

        Ok(match render_entries(&entries) {
            Some(text) => ToolResult::text(text),
            None => ToolResult::error(NO_LOGS_MESSAGE),
        })
    }
}

#[async_trait::async_trait]
impl ToolHandler for MetroToolHandler {
    async fn call(&self, name: &str, arguments: Value) -> ToolResult {
        let result = match name {
            GET_CONNECTED_APPS => self.get_connected_apps(arguments).await,
            READ_CONSOLE_LOGS_FROM_APP => self.read_console_logs(arguments).await,
            other => Err(format!("Unknown tool: {}", other)),
        };

        result.unwrap_or_else(|message| {
            error!(tool = %name, error = %message, "Tool call failed");
            ToolResult::error(format!("Error: {}", message))
        })
    }
}
