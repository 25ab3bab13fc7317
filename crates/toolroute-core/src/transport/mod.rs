//! Transport sessions for communicating with tool servers
//!
//! A transport is one bidirectional JSON-RPC 2.0 channel to a single server.
//! Two variants exist:
//! - `StdioTransport`: spawned child process, one JSON object per newline
//!   on stdin/stdout, responses correlated to requests by numeric id
//! - `HttpTransport`: one JSON-RPC envelope per HTTP POST
//!
//! Transports enforce per-request timeouts but never retry; retry policy
//! lives in the connection manager one level up.

mod framing;
mod handshake;
mod http;
mod stdio;

pub use framing::LineDecoder;
pub use handshake::{initialize, Handshake, PROTOCOL_VERSION};
pub use http::HttpTransport;
pub use stdio::StdioTransport;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Not connected")]
    NotConnected,
}

impl TransportError {
    /// Connection-class errors may be retried by the layer above.
    ///
    /// An explicit JSON-RPC `error` envelope or a malformed response is a
    /// semantic failure and must not be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectionFailed(_)
                | TransportError::Io(_)
                | TransportError::Timeout
                | TransportError::NotConnected
        )
    }

    /// Whether the underlying session is gone and must be reopened.
    ///
    /// A timeout is retryable but leaves the session usable; tearing it
    /// down would kill a server that is merely slow.
    pub fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectionFailed(_)
                | TransportError::Io(_)
                | TransportError::NotConnected
        )
    }
}

pub type TransportResult<T> = Result<T, TransportError>;

/// One JSON-RPC session with a single tool server
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and await the correlated response's `result` member
    async fn request(&self, method: &str, params: Value, timeout: Duration)
        -> TransportResult<Value>;

    /// Close the session, failing any pending requests
    async fn close(&self);
}

/// Build a JSON-RPC 2.0 request envelope
pub(crate) fn request_envelope(id: u64, method: &str, params: &Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
}

/// Split a JSON-RPC response envelope into result or error
pub(crate) fn parse_response(response: Value) -> TransportResult<Value> {
    if let Some(error) = response.get("error") {
        if !error.is_null() {
            let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
                .to_string();
            return Err(TransportError::Rpc { code, message });
        }
    }

    response
        .get("result")
        .cloned()
        .ok_or_else(|| TransportError::InvalidResponse("Missing result field".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let envelope = request_envelope(7, "tools/list", &json!({}));
        assert_eq!(envelope["jsonrpc"], "2.0");
        assert_eq!(envelope["id"], 7);
        assert_eq!(envelope["method"], "tools/list");
    }

    #[test]
    fn test_parse_response_result() {
        let result = parse_response(json!({"jsonrpc": "2.0", "id": 1, "result": {"ok": true}}));
        assert_eq!(result.unwrap()["ok"], true);
    }

    #[test]
    fn test_parse_response_error_wins() {
        let result = parse_response(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found"},
        }));
        match result {
            Err(TransportError::Rpc { code, message }) => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("expected Rpc error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_response_null_error_is_result() {
        let result = parse_response(json!({"jsonrpc": "2.0", "id": 1, "error": null, "result": 42}));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_parse_response_missing_result() {
        assert!(matches!(
            parse_response(json!({"jsonrpc": "2.0", "id": 1})),
            Err(TransportError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(TransportError::Timeout.is_retryable());
        assert!(TransportError::ConnectionFailed("refused".into()).is_retryable());
        assert!(TransportError::NotConnected.is_retryable());
        assert!(!TransportError::Rpc { code: -1, message: "boom".into() }.is_retryable());
        assert!(!TransportError::InvalidResponse("junk".into()).is_retryable());
    }
}
