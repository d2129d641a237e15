//! MCP Server implementation
//!
//! Newline-delimited JSON-RPC over stdio. Stdout carries only protocol
//! messages; logs go to stderr.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::protocol::{self, Request, RequestId, Response, RpcError};
use crate::tools::{self, ToolResult};

const SERVER_NAME: &str = "metrolog";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Tool handler trait
///
/// The seam between the RPC loop and tool execution.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, name: &str, arguments: Value) -> ToolResult;
}

/// MCP Server
pub struct McpServer<H: ToolHandler> {
    handler: Arc<H>,
    initialized: bool,
}

impl<H: ToolHandler> McpServer<H> {
    pub fn new(handler: H) -> Self {
        McpServer {
            handler: Arc::new(handler),
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the server on stdio until EOF
    pub async fn run(&mut self) -> anyhow::Result<()> {
        info!("Starting MCP server on stdio");
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve requests from `reader`, writing responses to `writer`
    pub async fn serve<R, W>(&mut self, mut reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();
        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                info!("EOF received, shutting down");
                break;
            }

            let message = line.trim();
            if message.is_empty() {
                continue;
            }

            debug!("Received: {}", message);

            let Some(response) = self.handle_message(message).await else {
                continue;
            };
            let response_json = protocol::serialize_response_string(&response)?;

            debug!("Sending: {}", response_json);

            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        Ok(())
    }

    /// Handle one line; `None` for notifications
    async fn handle_message(&mut self, message: &str) -> Option<Response> {
        match protocol::parse_request_str(message) {
            Ok(request) => self.handle_request(request).await,
            Err(err) => Some(Response::from_error(RequestId::Null, err)),
        }
    }

    async fn handle_request(&mut self, request: Request) -> Option<Response> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification");
            return None;
        };
        let method = request.method.as_str();
        let params = request.params.unwrap_or(Value::Null);

        let response = match method {
            "initialize" => self.handle_initialize(id),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, params).await,
            "ping" => Response::success(id, json!({})),
            _ => {
                warn!("Unknown method: {}", method);
                Response::from_error(id, RpcError::MethodNotFound(method.to_string()))
            }
        };
        Some(response)
    }

    fn handle_initialize(&mut self, id: RequestId) -> Response {
        self.initialized = true;
        info!("MCP server initialized");

        Response::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION,
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: RequestId) -> Response {
        Response::success(id, json!({ "tools": tools::all_tools() }))
    }

    async fn handle_tools_call(&self, id: RequestId, params: Value) -> Response {
        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(n) => n.to_string(),
            None => {
                return Response::from_error(
                    id,
                    RpcError::InvalidParams("Missing 'name' field".to_string()),
                );
            }
        };

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new()));

        debug!("Calling tool: {} with args: {:?}", name, arguments);

        if tools::get_tool(&name).is_none() {
            return Response::from_error(
                id,
                RpcError::InvalidParams(format!("Unknown tool: {}", name)),
            );
        }

        let result = self.handler.call(&name, arguments).await;

        match serde_json::to_value(result) {
            Ok(value) => Response::success(id, value),
            Err(e) => Response::from_error(id, RpcError::InternalError(e.to_string())),
        }
    }
}
