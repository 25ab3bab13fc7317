//! Session handshake
//!
//! The first call on any transport is `initialize`, declaring the protocol
//! version, the `tools` capability, and the client identity. A failed
//! handshake aborts session open.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use super::{Transport, TransportError, TransportResult};

/// Protocol revision this client speaks
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Successful handshake response
#[derive(Debug, Clone, Deserialize)]
pub struct Handshake {
    /// Protocol version the server answered with
    #[serde(rename = "protocolVersion", default)]
    pub protocol_version: String,
    /// Server capability set
    #[serde(default)]
    pub capabilities: Value,
    /// Server identity, if reported
    #[serde(rename = "serverInfo", default)]
    pub server_info: Value,
}

impl Handshake {
    /// Whether the server declared the tools capability
    pub fn supports_tools(&self) -> bool {
        self.capabilities.get("tools").is_some()
    }
}

/// Run the `initialize` handshake on a freshly opened transport
pub async fn initialize(transport: &dyn Transport, timeout: Duration) -> TransportResult<Handshake> {
    let params = json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "clientInfo": {
            "name": "toolroute-core",
            "version": env!("CARGO_PKG_VERSION"),
        },
    });

    let result = transport.request("initialize", params, timeout).await?;
    serde_json::from_value(result)
        .map_err(|e| TransportError::InvalidResponse(format!("initialize result: {}", e)))
}
