//! Server session state machine

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::transport::Transport;
use crate::types::ServerConfig;

/// Lifecycle state of one server session
///
/// `Unconfigured` is represented by absence from the session map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Transport open / handshake in progress
    Connecting,
    /// Handshake succeeded; calls allowed
    Connected,
    /// Last call failed with a connection-class error; reconnect before use
    Degraded,
    /// Open or handshake failed
    Failed,
    /// Deliberately shut down
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Degraded => "degraded",
            SessionState::Failed => "failed",
            SessionState::Closed => "closed",
        }
    }
}

/// One configured, enabled server's session
///
/// Owned exclusively by the connection manager.
pub(crate) struct ServerSession {
    pub config: ServerConfig,
    pub state: SessionState,
    pub last_error: Option<String>,
    pub transport: Option<Arc<dyn Transport>>,
}

impl ServerSession {
    pub fn connecting(config: ServerConfig) -> Self {
        Self {
            config,
            state: SessionState::Connecting,
            last_error: None,
            transport: None,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            name: self.config.name.clone(),
            state: self.state,
            last_error: self.last_error.clone(),
        }
    }
}

/// Read-only view of a session for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub name: String,
    pub state: SessionState,
    #[serde(rename = "lastError", skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
