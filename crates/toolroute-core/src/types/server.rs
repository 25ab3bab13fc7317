//! Tool server configuration types

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default per-call timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Transport used to reach a tool server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Spawned child process, newline-delimited JSON-RPC over stdin/stdout
    Stdio,
    /// One JSON-RPC envelope per HTTP POST
    Http,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Stdio => "stdio",
            TransportKind::Http => "http",
        }
    }
}

/// Configuration for a single tool server
///
/// Loaded from a named map, so `name` is injected from the map key after
/// deserialization. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server name (map key in the config file)
    #[serde(default)]
    pub name: String,
    /// Transport variant
    pub transport: TransportKind,
    /// Command to spawn (stdio transport)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Command arguments (stdio transport)
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables for the child process (stdio transport)
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Endpoint URL (http transport)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Disabled servers never get a session
    #[serde(default)]
    pub disabled: bool,
    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout_ms", rename = "timeoutMs")]
    pub timeout_ms: u64,
}

impl ServerConfig {
    /// Create a stdio server config
    pub fn stdio(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: TransportKind::Stdio,
            command: Some(command.into()),
            args: Vec::new(),
            env: HashMap::new(),
            url: None,
            disabled: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Create an HTTP server config
    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: TransportKind::Http,
            command: None,
            args: Vec::new(),
            env: HashMap::new(),
            url: Some(url.into()),
            disabled: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Set command arguments
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the server as disabled
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Set the per-call timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Per-call timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check that the required fields for the configured transport are present
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("missing server name".to_string());
        }
        match self.transport {
            TransportKind::Stdio => {
                if self.command.as_deref().map(str::trim).unwrap_or("").is_empty() {
                    return Err(format!("server '{}': stdio transport requires a command", self.name));
                }
            }
            TransportKind::Http => {
                if self.url.as_deref().map(str::trim).unwrap_or("").is_empty() {
                    return Err(format!("server '{}': http transport requires a url", self.name));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdio_config_validates() {
        let config = ServerConfig::stdio("calc", "calc-server").with_args(["--quiet"]);
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn test_stdio_config_requires_command() {
        let mut config = ServerConfig::stdio("calc", "calc-server");
        config.command = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_config_requires_url() {
        let mut config = ServerConfig::http("remote", "http://localhost:9000/rpc");
        assert!(config.validate().is_ok());
        config.url = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_requires_name() {
        let config = ServerConfig::stdio("", "calc-server");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_defaults() {
        let yaml = r#"
transport: stdio
command: calc-server
"#;
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.transport, TransportKind::Stdio);
        assert!(!config.disabled);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
