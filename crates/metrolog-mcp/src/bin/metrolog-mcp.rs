//! metrolog-mcp - MCP stdio server for Metro console logs
//!
//! Launched by an MCP client. Reads JSON-RPC from stdin and answers on stdout;
//! logs go to stderr.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use metrolog_mcp::config::{ServerConfig, DEFAULT_METRO_HOST};
use metrolog_mcp::{McpServer, MetroToolHandler};

#[derive(Parser, Debug)]
#[command(name = "metrolog-mcp")]
#[command(about = "MCP server that reads console logs from Metro-connected React Native apps")]
#[command(version)]
struct Args {
    /// Host the Metro server listens on
    #[arg(long, env = "METROLOG_METRO_HOST", default_value = DEFAULT_METRO_HOST)]
    metro_host: String,

    /// Time budget of one console capture, in milliseconds
    #[arg(long, env = "METROLOG_CAPTURE_TIMEOUT_MS", default_value_t = 5000)]
    capture_timeout_ms: u64,

    /// Entry cap used when a call does not pass maxLogs
    #[arg(long, env = "METROLOG_DEFAULT_MAX_LOGS", default_value_t = 100,
          value_parser = clap::value_parser!(u64).range(1..))]
    default_max_logs: u64,

    /// Timeout of the target discovery request, in milliseconds
    #[arg(long, env = "METROLOG_DISCOVERY_TIMEOUT_MS", default_value_t = 5000)]
    discovery_timeout_ms: u64,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            metro_host: self.metro_host.clone(),
            capture_timeout: Duration::from_millis(self.capture_timeout_ms),
            default_max_logs: self.default_max_logs as usize,
            discovery_timeout: Duration::from_millis(self.discovery_timeout_ms),
        }
    }
}

fn log_filter() -> tracing_subscriber::EnvFilter {
    let level = if let Ok(v) = std::env::var("RUST_LOG") {
        v
    } else if let Ok(v) = std::env::var("METROLOG_LOG_LEVEL") {
        match v.as_str() {
            "silent" => "off".to_string(),
            "fatal" => "error".to_string(),
            other => other.to_string(),
        }
    } else {
        "warn".to_string()
    };

    tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.server_config();
    tracing::debug!(?config, "Server configuration");

    let mut server = McpServer::new(MetroToolHandler::new(config));
    server.run().await?;
    Ok(())
}
