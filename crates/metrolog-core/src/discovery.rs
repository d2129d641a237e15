//! Inspector target discovery
//!
//! Metro lists debuggable pages at `/json/list`. Only pages that React Native
//! DevTools can attach to are returned.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};

use crate::types::DebugTarget;

/// Title of the legacy page that supports reloads without capability flags
pub const LEGACY_RELOADABLE_TITLE: &str = "React Native Experimental (Improved Chrome Reloads)";

/// Discovery failures
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Failed to query {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid target list from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// React Native page capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefers_fusebox_frontend: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_source_code_fetching: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_page_reloads: Option<bool>,
}

/// React Native specific target metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactNativeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_device_id: Option<String>,
    #[serde(default)]
    pub capabilities: Capabilities,
}

/// One entry of `/json/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorTarget {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    pub web_socket_debugger_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devtools_frontend_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub react_native: Option<ReactNativeInfo>,
    /// Fields this client does not model, passed through as received
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InspectorTarget {
    /// Whether React Native DevTools can attach to this page
    pub fn is_supported(&self) -> bool {
        let reloads = self
            .react_native
            .as_ref()
            .and_then(|rn| rn.capabilities.native_page_reloads)
            .unwrap_or(false);
        reloads || self.title == LEGACY_RELOADABLE_TITLE
    }

    /// Narrow to the capture input
    pub fn debug_target(&self) -> DebugTarget {
        DebugTarget {
            id: self.id.clone(),
            description: self.description.clone(),
            web_socket_debugger_url: self.web_socket_debugger_url.clone(),
        }
    }
}

/// Base URL of a Metro server
pub fn metro_origin(host: &str, port: u16) -> String {
    format!("http://{}:{}", host, port)
}

/// Keep only pages React Native DevTools can attach to
pub fn supported_targets(targets: Vec<InspectorTarget>) -> Vec<InspectorTarget> {
    targets.into_iter().filter(InspectorTarget::is_supported).collect()
}

/// Fetch the supported inspector targets from a Metro server
pub async fn discover_targets(
    origin: &str,
    timeout: Duration,
) -> Result<Vec<InspectorTarget>, DiscoveryError> {
    let url = format!("{}/json/list", origin.trim_end_matches('/'));
    debug!(%url, "Querying inspector targets");

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| DiscoveryError::Request {
            url: url.clone(),
            source,
        })?;

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|source| DiscoveryError::Request {
            url: url.clone(),
            source,
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(DiscoveryError::Status {
            url,
            status: status.as_u16(),
        });
    }

    let all: Vec<InspectorTarget> = resp
        .json()
        .await
        .map_err(|source| DiscoveryError::Decode {
            url: url.clone(),
            source,
        })?;
    let total = all.len();
    let targets = supported_targets(all);
    info!(%url, total, supported = targets.len(), "Inspector targets discovered");
    Ok(targets)
}
