//! Console capture session
//!
//! Connects to a target's debugger WebSocket, enables runtime notifications and
//! collects console calls until either the entry limit or the time budget is
//! reached. Running out of time is a normal outcome: whatever was collected is
//! returned, possibly nothing.
//!
//! ```text
//! Idle -> Connecting -> Active -> Closing -> Closed
//!            |            |
//!            +------------+------> Failed
//! ```
//!
//! Both stop triggers go through one [`CloseSignal`]; only the first request
//! wins and the close handshake is sent exactly once.

use futures_util::{SinkExt, StreamExt};
use tokio::time::{sleep_until, timeout, Instant};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, error, info, warn};

use crate::cdp::Command;
use crate::entry::{build_entry, LogEntry};
use crate::filter::{classify_bytes, is_unsupported_client_notice};
use crate::format::format_arguments;
use crate::types::{CaptureOptions, DebugTarget};

/// Capture failures. Timeouts are not errors.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("maxLogs must be at least 1")]
    InvalidOptions,

    #[error("Failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("Debugger connection failed: {0}")]
    Transport(#[source] tungstenite::Error),

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Active,
    Closing,
    Closed,
    Failed,
}

/// Why a session stopped collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The entry limit was reached
    EntryLimit,
    /// The time budget elapsed
    Timeout,
    /// The target closed the connection
    Remote,
}

/// One-shot close request shared by every stop trigger
#[derive(Debug, Default)]
pub struct CloseSignal {
    reason: Option<CloseReason>,
}

impl CloseSignal {
    /// Record a close request. Returns `true` only for the first request.
    pub fn request(&mut self, reason: CloseReason) -> bool {
        if self.reason.is_some() {
            return false;
        }
        self.reason = Some(reason);
        true
    }

    pub fn is_requested(&self) -> bool {
        self.reason.is_some()
    }

    pub fn reason(&self) -> Option<CloseReason> {
        self.reason
    }
}

/// Result of a finished session
#[derive(Debug, Clone)]
pub struct CaptureReport {
    /// Entries in arrival order
    pub entries: Vec<LogEntry>,
    pub close_reason: Option<CloseReason>,
}

/// Capture console output from one target with the given bounds
pub async fn capture(
    target: &DebugTarget,
    options: CaptureOptions,
) -> Result<Vec<LogEntry>, CaptureError> {
    let report = CaptureSession::new(options)
        .run(&target.web_socket_debugger_url)
        .await?;
    Ok(report.entries)
}

/// State for a single capture call
///
/// Each session owns its accumulator, close signal and timer; nothing is
/// shared between sessions.
pub struct CaptureSession {
    options: CaptureOptions,
    state: SessionState,
    entries: Vec<LogEntry>,
    close: CloseSignal,
    next_id: u64,
}

impl CaptureSession {
    pub fn new(options: CaptureOptions) -> Self {
        Self {
            options,
            state: SessionState::Idle,
            entries: Vec::new(),
            close: CloseSignal::default(),
            next_id: 1,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Ask the session to stop. Later requests are no-ops.
    pub fn request_close(&mut self, reason: CloseReason) -> bool {
        let first = self.close.request(reason);
        if first {
            debug!(?reason, collected = self.entries.len(), "Close requested");
        }
        first
    }

    /// Run one inbound frame through filter, formatter and builder.
    ///
    /// Returns `true` if an entry was appended. Frames arriving after a close
    /// request are dropped.
    pub fn ingest(&mut self, frame: &[u8]) -> bool {
        if self.close.is_requested() {
            return false;
        }

        let Some(event) = classify_bytes(frame) else {
            return false;
        };

        let text = format_arguments(&event.args);
        if is_unsupported_client_notice(&text) {
            debug!("Skipping unsupported debugging client notice");
            return false;
        }

        self.entries
            .push(build_entry(event.level, text, event.args, event.stack_trace));

        if self.entries.len() >= self.options.max_entries {
            self.request_close(CloseReason::EntryLimit);
        }
        true
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "Capture state");
        self.state = next;
    }

    fn next_request_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn finish(mut self) -> CaptureReport {
        self.transition(SessionState::Closed);
        CaptureReport {
            entries: self.entries,
            close_reason: self.close.reason(),
        }
    }

    /// Connect to `url` and collect entries until a stop trigger fires
    pub async fn run(mut self, url: &str) -> Result<CaptureReport, CaptureError> {
        if self.options.max_entries == 0 {
            return Err(CaptureError::InvalidOptions);
        }

        // Watchdog is armed when connecting starts; after a close is sent it
        // is re-armed to bound the wait for the peer's confirmation.
        let watchdog = sleep_until(Instant::now() + self.options.timeout);
        tokio::pin!(watchdog);

        self.transition(SessionState::Connecting);
        debug!(url, "Connecting to debugger");

        let connected = tokio::select! {
            res = connect_async(url) => res,
            _ = &mut watchdog => {
                warn!(url, "Capture time budget elapsed before the connection opened");
                self.request_close(CloseReason::Timeout);
                return Ok(self.finish());
            }
        };

        let (ws_stream, _) = match connected {
            Ok(conn) => conn,
            Err(source) => {
                self.transition(SessionState::Failed);
                return Err(CaptureError::Connect {
                    url: url.to_string(),
                    source,
                });
            }
        };
        let (mut ws_tx, mut ws_rx) = ws_stream.split();

        self.transition(SessionState::Active);
        info!(url, max_entries = self.options.max_entries, "Debugger connection open");

        let enable = serde_json::to_string(&Command::runtime_enable(self.next_request_id()))?;
        if let Err(e) = ws_tx.send(Message::Text(enable)).await {
            error!(error = %e, "Failed to enable runtime notifications");
            self.transition(SessionState::Failed);
            return Err(CaptureError::Transport(e));
        }

        let mut close_sent = false;
        loop {
            if self.close.is_requested() && !close_sent {
                self.transition(SessionState::Closing);
                close_sent = true;
                if let Err(e) = ws_tx.close().await {
                    debug!(error = %e, "Close handshake could not be sent");
                    break;
                }
                watchdog
                    .as_mut()
                    .reset(Instant::now() + self.options.close_grace);
            }

            tokio::select! {
                _ = &mut watchdog => {
                    if close_sent {
                        debug!("Debugger did not confirm close in time");
                        break;
                    }
                    self.request_close(CloseReason::Timeout);
                }
                frame = ws_rx.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        self.ingest(text.as_bytes());
                    }
                    Some(Ok(Message::Binary(data))) => {
                        self.ingest(&data);
                    }
                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "Debugger closed the connection");
                        self.request_close(CloseReason::Remote);
                        break;
                    }
                    Some(Ok(_)) => {}
                    None => {
                        self.request_close(CloseReason::Remote);
                        break;
                    }
                    Some(Err(tungstenite::Error::Protocol(
                        ProtocolError::ResetWithoutClosingHandshake,
                    ))) => {
                        debug!("Debugger went away without a close handshake");
                        self.request_close(CloseReason::Remote);
                        break;
                    }
                    Some(Err(e)) => {
                        if close_sent {
                            debug!(error = %e, "Error while closing, treating as closed");
                            break;
                        }
                        error!(error = %e, "Debugger connection failed");
                        self.transition(SessionState::Failed);
                        return Err(CaptureError::Transport(e));
                    }
                }
            }
        }

        if !close_sent {
            // Flush the reply to a peer-initiated close
            match timeout(self.options.close_grace, ws_tx.close()).await {
                Ok(Err(e)) => debug!(error = %e, "Close after remote close failed"),
                Err(_) => debug!("Close after remote close timed out"),
                Ok(Ok(())) => {}
            }
        }

        let report = self.finish();
        info!(
            entries = report.entries.len(),
            reason = ?report.close_reason,
            "Capture finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use std::future::Future;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;
    use tokio_tungstenite::{accept_async, WebSocketStream};

    type TargetSocket = WebSocketStream<TcpStream>;

    /// Serve one debugger connection on an ephemeral port, scripted by `script`
    async fn spawn_target<F, Fut>(script: F) -> String
    where
        F: FnOnce(TargetSocket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let ws = accept_async(stream).await.unwrap();
            script(ws).await;
        });
        format!("ws://{}/inspector/debug?device=0&page=1", addr)
    }

    fn console_frame(level: &str, text: &str) -> Message {
        Message::Text(
            json!({
                "method": "Runtime.consoleAPICalled",
                "params": {
                    "type": level,
                    "args": [{ "type": "string", "value": text }],
                    "executionContextId": 1,
                    "timestamp": 1.0,
                    "stackTrace": {
                        "callFrames": [{
                            "functionName": "",
                            "scriptId": "1",
                            "url": "index.bundle",
                            "lineNumber": 41,
                            "columnNumber": 7
                        }]
                    }
                }
            })
            .to_string(),
        )
    }

    /// Read until the client goes away; reading past the close frame flushes the reply
    async fn drain(ws: &mut TargetSocket) {
        while let Some(Ok(_)) = ws.next().await {}
    }

    fn short_options(max_entries: usize, budget_ms: u64) -> CaptureOptions {
        CaptureOptions {
            max_entries,
            timeout: Duration::from_millis(budget_ms),
            close_grace: Duration::from_millis(200),
        }
    }

    fn target(url: String) -> DebugTarget {
        DebugTarget {
            id: "page1".to_string(),
            description: "com.example.app".to_string(),
            web_socket_debugger_url: url,
        }
    }

    #[tokio::test]
    async fn test_sends_runtime_enable_first() {
        let (tx, rx) = oneshot::channel();
        let url = spawn_target(|mut ws| async move {
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                let _ = tx.send(text);
            }
            drain(&mut ws).await;
        })
        .await;

        let entries = capture(&target(url), short_options(10, 200)).await.unwrap();
        assert!(entries.is_empty());

        let first: serde_json::Value = serde_json::from_str(&rx.await.unwrap()).unwrap();
        assert_eq!(first, json!({ "id": 1, "method": "Runtime.enable" }));
    }

    #[tokio::test]
    async fn test_quiet_target_resolves_at_timeout_with_partial_result() {
        let url = spawn_target(|mut ws| async move {
            let _ = ws.next().await;
            for i in 0..3 {
                ws.send(console_frame("log", &format!("line {}", i))).await.unwrap();
            }
            drain(&mut ws).await;
        })
        .await;

        let started = std::time::Instant::now();
        let report = CaptureSession::new(short_options(100, 300))
            .run(&url)
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(300));
        assert_eq!(report.close_reason, Some(CloseReason::Timeout));
        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.entries[0].text, "line 0");
        assert!(report.entries.iter().all(|e| e.diagnostics.is_none()));
    }

    #[tokio::test]
    async fn test_timeout_with_no_events_is_success() {
        let url = spawn_target(|mut ws| async move {
            drain(&mut ws).await;
        })
        .await;

        let entries = capture(&target(url), short_options(5, 150)).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_stops_at_entry_limit() {
        let url = spawn_target(|mut ws| async move {
            let _ = ws.next().await;
            for i in 0..150 {
                if ws.send(console_frame("log", &format!("log {}", i))).await.is_err() {
                    return;
                }
            }
            drain(&mut ws).await;
        })
        .await;

        let started = std::time::Instant::now();
        let report = CaptureSession::new(short_options(100, 10_000))
            .run(&url)
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(report.close_reason, Some(CloseReason::EntryLimit));
        assert_eq!(report.entries.len(), 100);
        for (i, entry) in report.entries.iter().enumerate() {
            assert_eq!(entry.text, format!("log {}", i));
        }
    }

    #[tokio::test]
    async fn test_filters_noise_and_sentinel() {
        let url = spawn_target(|mut ws| async move {
            let _ = ws.next().await;
            ws.send(Message::Text(r#"{"id":1,"result":{}}"#.to_string())).await.unwrap();
            ws.send(Message::Text("garbage{".to_string())).await.unwrap();
            ws.send(console_frame("warning", crate::filter::UNSUPPORTED_CLIENT_MESSAGE))
                .await
                .unwrap();
            ws.send(Message::Text(
                json!({ "method": "Runtime.executionContextCreated", "params": {} }).to_string(),
            ))
            .await
            .unwrap();
            ws.send(console_frame("log", "kept")).await.unwrap();
            drain(&mut ws).await;
        })
        .await;

        let entries = capture(&target(url), short_options(1, 5_000)).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "kept");
    }

    #[tokio::test]
    async fn test_errors_and_warnings_keep_diagnostics() {
        let url = spawn_target(|mut ws| async move {
            let _ = ws.next().await;
            ws.send(console_frame("error", "boom")).await.unwrap();
            ws.send(console_frame("warning", "hmm")).await.unwrap();
            ws.send(console_frame("info", "fyi")).await.unwrap();
            drain(&mut ws).await;
        })
        .await;

        let entries = capture(&target(url), short_options(3, 5_000)).await.unwrap();
        assert_eq!(entries.len(), 3);

        let error = &entries[0];
        assert!(error.is_error());
        assert_eq!(error.args().map(|a| a.len()), Some(1));
        let top = error.stack_trace().and_then(|t| t.top_frame()).unwrap();
        assert_eq!(top.line_number, 41);

        assert!(entries[1].is_warning());
        assert!(entries[1].diagnostics.is_some());
        assert!(entries[2].diagnostics.is_none());
    }

    #[tokio::test]
    async fn test_remote_close_returns_collected() {
        let url = spawn_target(|mut ws| async move {
            let _ = ws.next().await;
            ws.send(console_frame("log", "bye")).await.unwrap();
            ws.close(None).await.unwrap();
            drain(&mut ws).await;
        })
        .await;

        let report = CaptureSession::new(short_options(10, 5_000))
            .run(&url)
            .await
            .unwrap();
        assert_eq!(report.close_reason, Some(CloseReason::Remote));
        assert_eq!(report.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = capture(&target(format!("ws://{}", addr)), short_options(10, 2_000))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Connect { .. }), "{:?}", err);
        assert!(err.to_string().contains(&addr.to_string()));
    }

    #[tokio::test]
    async fn test_invalid_url_is_connect_error() {
        let err = capture(&target("not a url".to_string()), short_options(10, 1_000))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Connect { .. }));
    }

    #[tokio::test]
    async fn test_protocol_violation_fails_session() {
        let url = spawn_target(|mut ws| async move {
            let _ = ws.next().await;
            ws.send(console_frame("log", "discarded")).await.unwrap();
            // Text frame with reserved bits set
            let raw = ws.get_mut();
            raw.write_all(&[0xF1, 0x00]).await.unwrap();
            raw.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
        })
        .await;

        let err = capture(&target(url), short_options(10, 5_000)).await.unwrap_err();
        assert!(matches!(err, CaptureError::Transport(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_zero_max_entries_rejected() {
        let err = CaptureSession::new(short_options(0, 100))
            .run("ws://127.0.0.1:9")
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::InvalidOptions));
    }

    #[test]
    fn test_close_signal_first_request_wins() {
        let mut signal = CloseSignal::default();
        assert!(!signal.is_requested());
        assert!(signal.request(CloseReason::EntryLimit));
        assert!(!signal.request(CloseReason::Timeout));
        assert!(!signal.request(CloseReason::Remote));
        assert_eq!(signal.reason(), Some(CloseReason::EntryLimit));
    }

    #[test]
    fn test_ingest_stops_at_limit() {
        let mut session = CaptureSession::new(short_options(2, 1_000));
        let frame = |text: &str| match console_frame("log", text) {
            Message::Text(t) => t,
            _ => unreachable!(),
        };

        assert!(session.ingest(frame("a").as_bytes()));
        assert!(session.ingest(frame("b").as_bytes()));
        assert!(!session.ingest(frame("c").as_bytes()));
        assert_eq!(session.entries().len(), 2);
        assert!(!session.request_close(CloseReason::Timeout));
    }

    #[test]
    fn test_ingest_ignores_malformed() {
        let mut session = CaptureSession::new(CaptureOptions::default());
        assert!(!session.ingest(b"{"));
        assert!(!session.ingest(b"{\"method\":\"Debugger.paused\",\"params\":{}}"));
        assert!(session.entries().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }
}
