//! Connection manager
//!
//! Single owner of the name-to-session map and the discovered tool
//! catalogue. One server's failure never blocks another's bring-up, and
//! only connection-class call failures are retried.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use super::session::{ServerSession, SessionSnapshot, SessionState};
use super::{ManagerError, ManagerResult};
use crate::logging::SharedLogger;
use crate::transport::{initialize, HttpTransport, StdioTransport, Transport, TransportResult};
use crate::types::{ServerConfig, ToolDescriptor, TransportKind};

/// Default per-call timeout
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of attempts per call (1 = no retry)
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 1;

/// Fixed backoff between retry attempts
pub const RETRY_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Deserialize)]
struct ToolsListResult {
    #[serde(default)]
    tools: Vec<ToolEntry>,
}

#[derive(Deserialize)]
struct ToolEntry {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "inputSchema")]
    input_schema: Value,
}

/// Owns the set of named server sessions and the tool catalogue
pub struct ConnectionManager {
    sessions: parking_lot::RwLock<HashMap<String, ServerSession>>,
    tools: parking_lot::RwLock<HashMap<String, ToolDescriptor>>,
    logger: SharedLogger,
}

impl ConnectionManager {
    /// Create an empty manager
    pub fn new(logger: SharedLogger) -> Self {
        Self {
            sessions: parking_lot::RwLock::new(HashMap::new()),
            tools: parking_lot::RwLock::new(HashMap::new()),
            logger,
        }
    }

    /// Connect one configured server and discover its tools
    ///
    /// Disabled servers are skipped without creating a session. Failures
    /// are recorded on the session and returned; callers isolate them.
    pub async fn connect(&self, config: &ServerConfig) -> ManagerResult<()> {
        if config.disabled {
            self.logger.info(&format!("[ConnectionManager] Skipping disabled server '{}'", config.name));
            return Ok(());
        }

        self.sessions
            .write()
            .insert(config.name.clone(), ServerSession::connecting(config.clone()));

        match self.open_transport(config).await {
            Ok(transport) => {
                {
                    let mut sessions = self.sessions.write();
                    if let Some(session) = sessions.get_mut(&config.name) {
                        session.transport = Some(Arc::clone(&transport));
                        session.state = SessionState::Connected;
                        session.last_error = None;
                    }
                }
                self.logger.info(&format!("[ConnectionManager] Connected to '{}'", config.name));

                if let Err(e) = self.discover(&config.name, &transport, config.timeout()).await {
                    self.logger.warn(&format!(
                        "[ConnectionManager] Tool discovery failed for '{}': {}",
                        config.name, e
                    ));
                }
                Ok(())
            }
            Err(e) => {
                self.set_state(&config.name, SessionState::Failed, Some(e.to_string()));
                self.logger.error(&format!(
                    "[ConnectionManager] Failed to connect '{}': {}",
                    config.name, e
                ));
                Err(e.into())
            }
        }
    }

    /// Connect every server concurrently, with per-server failure isolation
    ///
    /// Returns the number of servers that reached Connected.
    pub async fn connect_all(&self, configs: &[ServerConfig]) -> usize {
        let attempts = configs.iter().map(|config| self.connect(config));
        let results = futures::future::join_all(attempts).await;

        for (config, result) in configs.iter().zip(&results) {
            if let Err(e) = result {
                self.logger.warn(&format!(
                    "[ConnectionManager] Server '{}' unavailable: {}",
                    config.name, e
                ));
            }
        }

        self.connected_count()
    }

    async fn open_transport(&self, config: &ServerConfig) -> TransportResult<Arc<dyn Transport>> {
        let transport: Arc<dyn Transport> = match config.transport {
            TransportKind::Stdio => {
                let command = config.command.as_deref().unwrap_or_default();
                Arc::new(StdioTransport::spawn(
                    &config.name,
                    command,
                    &config.args,
                    &config.env,
                    self.logger.clone(),
                )?)
            }
            TransportKind::Http => {
                let url = config.url.as_deref().unwrap_or_default();
                Arc::new(HttpTransport::new(url, self.logger.clone()))
            }
        };

        // Handshake failure aborts session open.
        let handshake = initialize(transport.as_ref(), config.timeout()).await?;
        self.logger.debug(&format!(
            "[ConnectionManager] Handshake with '{}' ok (protocol {})",
            config.name, handshake.protocol_version
        ));

        Ok(transport)
    }

    async fn discover(
        &self,
        server_name: &str,
        transport: &Arc<dyn Transport>,
        timeout: Duration,
    ) -> ManagerResult<usize> {
        let result = transport.request("tools/list", json!({}), timeout).await?;
        let listed: ToolsListResult = serde_json::from_value(result)
            .map_err(crate::transport::TransportError::from)?;

        let count = listed.tools.len();
        let mut tools = self.tools.write();
        // Refresh: drop this server's previous entries before inserting.
        tools.retain(|_, tool| tool.server_name != server_name);
        for entry in listed.tools {
            let descriptor = ToolDescriptor::new(
                entry.name.clone(),
                entry.description.unwrap_or_default(),
                server_name,
            )
            .with_schema(entry.input_schema);
            tools.insert(entry.name, descriptor);
        }
        drop(tools);

        self.logger.info(&format!(
            "[ConnectionManager] Discovered {} tools from '{}'",
            count, server_name
        ));
        Ok(count)
    }

    /// Call a tool on a named server with bounded retries
    ///
    /// Only timeout and connection-class errors are retried; a JSON-RPC
    /// `error` envelope is a semantic failure and is returned immediately.
    pub async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: Value,
        timeout: Duration,
        retry_attempts: u32,
    ) -> ManagerResult<Value> {
        let attempts = retry_attempts.max(1);
        let mut last_error: Option<ManagerError> = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(RETRY_BACKOFF).await;
            }

            let transport = match self.callable_transport(server).await {
                Ok(transport) => transport,
                Err(e @ ManagerError::Transport(_)) => {
                    // Reconnect failed; eligible for another attempt.
                    last_error = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let params = json!({ "name": tool, "arguments": arguments });
            match transport.request("tools/call", params, timeout).await {
                Ok(result) => {
                    self.set_state(server, SessionState::Connected, None);
                    return Ok(result);
                }
                Err(e) if e.is_retryable() => {
                    self.logger.warn(&format!(
                        "[ConnectionManager] Call to '{}' on '{}' failed (attempt {}/{}): {}",
                        tool, server, attempt, attempts, e
                    ));
                    // A lost connection degrades the session so the next
                    // attempt reconnects; a timeout retries on the live
                    // session as-is.
                    if e.is_connection_loss() {
                        self.set_state(server, SessionState::Degraded, Some(e.to_string()));
                    }
                    last_error = Some(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_error.unwrap_or_else(|| ManagerError::ServerNotConnected(server.to_string())))
    }

    /// Call a tool located by name in the discovered catalogue
    pub async fn call_named_tool(
        &self,
        tool: &str,
        arguments: Value,
        timeout: Option<Duration>,
        retry_attempts: Option<u32>,
    ) -> ManagerResult<Value> {
        let descriptor = self
            .tool(tool)
            .ok_or_else(|| ManagerError::ToolNotFound(tool.to_string()))?;
        self.call_tool(
            &descriptor.server_name,
            tool,
            arguments,
            timeout.unwrap_or(DEFAULT_CALL_TIMEOUT),
            retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS),
        )
        .await
    }

    async fn callable_transport(&self, server: &str) -> ManagerResult<Arc<dyn Transport>> {
        let (state, transport, config) = {
            let sessions = self.sessions.read();
            let session = sessions
                .get(server)
                .ok_or_else(|| ManagerError::ServerNotFound(server.to_string()))?;
            (session.state, session.transport.clone(), session.config.clone())
        };

        match state {
            SessionState::Connected => {
                transport.ok_or_else(|| ManagerError::ServerNotConnected(server.to_string()))
            }
            SessionState::Degraded => self.reconnect(&config).await,
            _ => Err(ManagerError::ServerNotConnected(server.to_string())),
        }
    }

    /// Replace a degraded session's transport with a fresh one
    async fn reconnect(&self, config: &ServerConfig) -> ManagerResult<Arc<dyn Transport>> {
        self.logger.info(&format!("[ConnectionManager] Reconnecting '{}'", config.name));

        let old = {
            let mut sessions = self.sessions.write();
            sessions.get_mut(&config.name).and_then(|s| s.transport.take())
        };
        if let Some(old) = old {
            old.close().await;
        }

        match self.open_transport(config).await {
            Ok(transport) => {
                let mut sessions = self.sessions.write();
                if let Some(session) = sessions.get_mut(&config.name) {
                    session.transport = Some(Arc::clone(&transport));
                    session.state = SessionState::Connected;
                    session.last_error = None;
                }
                Ok(transport)
            }
            Err(e) => {
                self.set_state(&config.name, SessionState::Degraded, Some(e.to_string()));
                Err(e.into())
            }
        }
    }

    fn set_state(&self, server: &str, state: SessionState, last_error: Option<String>) {
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.get_mut(server) {
            session.state = state;
            if last_error.is_some() {
                session.last_error = last_error;
            }
        }
    }

    /// Current state of one session
    pub fn session_state(&self, server: &str) -> Option<SessionState> {
        self.sessions.read().get(server).map(|s| s.state)
    }

    /// Read-only snapshots of all sessions
    pub fn sessions(&self) -> Vec<SessionSnapshot> {
        self.sessions.read().values().map(ServerSession::snapshot).collect()
    }

    /// Number of sessions currently Connected
    pub fn connected_count(&self) -> usize {
        self.sessions
            .read()
            .values()
            .filter(|s| s.state == SessionState::Connected)
            .count()
    }

    /// All discovered tools
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.read().values().cloned().collect()
    }

    /// Look up one discovered tool by name
    pub fn tool(&self, name: &str) -> Option<ToolDescriptor> {
        self.tools.read().get(name).cloned()
    }

    /// Number of discovered tools
    pub fn tool_count(&self) -> usize {
        self.tools.read().len()
    }

    /// Attach persisted metadata to a discovered tool
    pub fn annotate_tool(&self, name: &str, examples: Vec<String>, embedding: Option<Vec<f32>>) {
        let mut tools = self.tools.write();
        if let Some(tool) = tools.get_mut(name) {
            if !examples.is_empty() {
                tool.examples = examples;
            }
            if embedding.is_some() {
                tool.embedding = embedding;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn register_tool(&self, descriptor: ToolDescriptor) {
        self.tools.write().insert(descriptor.name.clone(), descriptor);
    }

    /// Close every session and mark it Closed
    pub async fn disconnect_all(&self) {
        let transports: Vec<(String, Arc<dyn Transport>)> = {
            let mut sessions = self.sessions.write();
            sessions
                .iter_mut()
                .filter_map(|(name, session)| {
                    session.state = SessionState::Closed;
                    session.transport.take().map(|t| (name.clone(), t))
                })
                .collect()
        };

        for (name, transport) in transports {
            transport.close().await;
            self.logger.debug(&format!("[ConnectionManager] Closed session '{}'", name));
        }
    }
}
