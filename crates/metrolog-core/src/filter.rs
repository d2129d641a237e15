//! Inbound frame filtering
//!
//! Everything that is not a console call is dropped here, including frames
//! that fail to parse. Parse failures never abort a capture session.

use tracing::debug;

use crate::cdp::{ConsoleApiCalled, InboundMessage, RemoteValue, StackTrace, CONSOLE_API_CALLED};

/// Printed by Metro when the debugger client is not React Native DevTools
pub const UNSUPPORTED_CLIENT_MESSAGE: &str = "You are using an unsupported debugging client. Use the Dev Menu in your app (or type `j` in the Metro terminal) to open React Native DevTools.";

/// Severity used when a console call reports no type
pub const DEFAULT_LEVEL: &str = "log";

/// A console call extracted from a frame, not yet rendered
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleEvent {
    pub level: String,
    pub args: Vec<RemoteValue>,
    pub stack_trace: Option<StackTrace>,
}

impl From<ConsoleApiCalled> for ConsoleEvent {
    fn from(payload: ConsoleApiCalled) -> Self {
        ConsoleEvent {
            level: payload.kind.unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
            args: payload.args,
            stack_trace: payload.stack_trace,
        }
    }
}

/// Classify a raw frame; `None` means ignore
pub fn classify_bytes(data: &[u8]) -> Option<ConsoleEvent> {
    let message: InboundMessage = match serde_json::from_slice(data) {
        Ok(m) => m,
        Err(e) => {
            debug!(error = %e, "Dropping unparseable frame");
            return None;
        }
    };

    if message.method.as_deref() != Some(CONSOLE_API_CALLED) {
        return None;
    }

    let params = message.params?;
    match serde_json::from_value::<ConsoleApiCalled>(params) {
        Ok(payload) => Some(payload.into()),
        Err(e) => {
            debug!(error = %e, "Dropping malformed console payload");
            None
        }
    }
}

/// Whether rendered console text is the unsupported-client notice
pub fn is_unsupported_client_notice(rendered: &str) -> bool {
    rendered.contains(UNSUPPORTED_CLIENT_MESSAGE)
}
