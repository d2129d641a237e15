//! MCP tool catalog
//!
//! Tool names, descriptions and input schemas, plus the result envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const GET_CONNECTED_APPS: &str = "getConnectedApps";
pub const READ_CONSOLE_LOGS_FROM_APP: &str = "readConsoleLogsFromApp";

/// Tool definition following MCP schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        ToolDefinition {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Tool result content type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Tool call result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolResult {
    /// Single text item
    pub fn text(text: impl Into<String>) -> Self {
        ToolResult {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: None,
        }
    }

    /// One text item per string
    pub fn texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ToolResult {
            content: texts
                .into_iter()
                .map(|t| ToolContent::Text { text: t.into() })
                .collect(),
            is_error: None,
        }
    }

    /// Error result with the message as plain text
    pub fn error(message: impl Into<String>) -> Self {
        ToolResult {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// Text of the first content item
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| match c {
            ToolContent::Text { text } => text.as_str(),
        })
    }
}

/// Generate all tool definitions
pub fn all_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            GET_CONNECTED_APPS,
            "Get the connected apps",
            json!({
                "type": "object",
                "properties": {
                    "metroServerPort": {
                        "type": "number",
                        "description": "The port number of the Metro server"
                    }
                },
                "required": ["metroServerPort"]
            }),
        ),
        ToolDefinition::new(
            READ_CONSOLE_LOGS_FROM_APP,
            "Reads console logs from a connected React Native app through the debugger WebSocket",
            json!({
                "type": "object",
                "properties": {
                    "app": {
                        "type": "object",
                        "description": "The app object as returned by getConnectedApps",
                        "properties": {
                            "id": {
                                "type": "string",
                                "description": "The Metro application ID"
                            },
                            "description": {
                                "type": "string",
                                "description": "The Metro application's bundle ID"
                            },
                            "webSocketDebuggerUrl": {
                                "type": "string",
                                "description": "The websocket debugger URL for the application"
                            }
                        },
                        "required": ["id", "description", "webSocketDebuggerUrl"]
                    },
                    "maxLogs": {
                        "type": "number",
                        "description": "Maximum number of logs to return (default: 100)"
                    }
                },
                "required": ["app"]
            }),
        ),
    ]
}

/// Look up a tool by name
pub fn get_tool(name: &str) -> Option<ToolDefinition> {
    all_tools().into_iter().find(|t| t.name == name)
}
