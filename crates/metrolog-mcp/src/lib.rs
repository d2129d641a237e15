//! MCP (Model Context Protocol) server for metrolog
//!
//! Exposes two tools over JSON-RPC 2.0 on stdio:
//!
//! - `getConnectedApps`: list the React Native apps attached to a Metro server
//! - `readConsoleLogsFromApp`: capture console output from one of them
//!
//! # Example
//!
//! ```no_run
//! use metrolog_mcp::{McpServer, MetroToolHandler, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = McpServer::new(MetroToolHandler::new(ServerConfig::default()));
//!     server.run().await
//! }
//! ```

pub mod config;
pub mod handler;
pub mod protocol;
pub mod render;
pub mod server;
pub mod tools;

pub use config::ServerConfig;
pub use handler::MetroToolHandler;
pub use protocol::{Request, RequestId, Response, RpcError};
pub use server::{McpServer, ToolHandler};
pub use tools::{all_tools, get_tool, ToolContent, ToolDefinition, ToolResult};
