//! HTTP transport
//!
//! Each request is one POST carrying a JSON-RPC envelope; the response body
//! is a single JSON-RPC response. There is no shared connection state, so
//! concurrent requests are independently correlated by construction.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{parse_response, request_envelope, Transport, TransportError, TransportResult};
use crate::logging::SharedLogger;

/// JSON-RPC session over HTTP POST
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
    logger: SharedLogger,
}

impl HttpTransport {
    /// Create a session for the given endpoint URL
    pub fn new(url: impl Into<String>, logger: SharedLogger) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
            logger,
        }
    }

    /// The endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> TransportResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let envelope = request_envelope(id, method, &params);

        self.logger.debug(&format!(
            "[HttpTransport] POST {} id={} method={}",
            self.url, id, method
        ));

        let response = self
            .client
            .post(&self.url)
            .timeout(timeout)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::ConnectionFailed(format!(
                "HTTP status {} from {}",
                status, self.url
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(format!("response body: {}", e)))?;

        parse_response(body)
    }

    async fn close(&self) {
        // Connectionless; nothing to tear down.
    }
}
