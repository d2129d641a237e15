//! metrolog-core - console capture for Metro-connected React Native apps
//!
//! Attaches to a JavaScript debug target over the debugger protocol WebSocket,
//! enables runtime notifications and returns the console calls it observes,
//! bounded by an entry count and a time budget.
//!
//! # Example
//!
//! ```no_run
//! use metrolog_core::{capture, discover_targets, metro_origin, CaptureOptions};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let targets = discover_targets(&metro_origin("localhost", 8081), Duration::from_secs(5)).await?;
//!     if let Some(app) = targets.first() {
//!         let entries = capture(&app.debug_target(), CaptureOptions::default()).await?;
//!         for entry in entries {
//!             println!("[{}] {}", entry.level, entry.text);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod capture;
pub mod cdp;
pub mod discovery;
pub mod entry;
pub mod filter;
pub mod format;
pub mod types;

pub use capture::{capture, CaptureError, CaptureReport, CaptureSession, CloseReason, SessionState};
pub use cdp::{CallFrame, ObjectSubtype, RemoteValue, StackTrace, ValueKind};
pub use discovery::{discover_targets, metro_origin, DiscoveryError, InspectorTarget};
pub use entry::{build_entry, Diagnostics, LogEntry};
pub use format::{format_argument, format_arguments};
pub use types::{CaptureOptions, DebugTarget, DEFAULT_CAPTURE_TIMEOUT, DEFAULT_MAX_ENTRIES};
