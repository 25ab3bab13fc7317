//! Server configuration provider trait

use async_trait::async_trait;

use crate::logging::SharedLogger;
use crate::types::ServerConfig;

/// Errors that can occur while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Other(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Source of the server configuration list
///
/// Implementations:
/// - `MemoryServerConfig`: In-memory for testing
/// - `FileServerConfig`: Reads from a YAML file (~/.config/toolroute/servers.yaml)
/// - Host adapters: database-backed configuration tables
#[async_trait]
pub trait ServerConfigProvider: Send + Sync {
    /// Load all configured servers, including disabled ones
    async fn load_servers(&self) -> ConfigResult<Vec<ServerConfig>>;
}

/// Drop entries missing required fields, keeping the rest
///
/// A malformed server is a logged warning, not a fatal error: one bad entry
/// must not block bring-up of the others.
pub fn validate_servers(configs: Vec<ServerConfig>, logger: &SharedLogger) -> Vec<ServerConfig> {
    configs
        .into_iter()
        .filter(|config| match config.validate() {
            Ok(()) => true,
            Err(reason) => {
                logger.warn(&format!("[Config] Dropping server config: {}", reason));
                false
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::logging::NoOpLogger;

    #[test]
    fn test_validate_drops_malformed_entries() {
        let logger: SharedLogger = Arc::new(NoOpLogger::new());
        let mut broken = ServerConfig::stdio("broken", "cmd");
        broken.command = None;

        let valid = validate_servers(
            vec![
                ServerConfig::stdio("calc", "calc-server"),
                broken,
                ServerConfig::http("remote", "http://localhost:9000/rpc"),
            ],
            &logger,
        );

        let names: Vec<_> = valid.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["calc", "remote"]);
    }

    #[test]
    fn test_validate_keeps_disabled_entries() {
        // Disabled servers stay in the list; the connection manager is the
        // layer that refuses to open sessions for them.
        let logger: SharedLogger = Arc::new(NoOpLogger::new());
        let valid = validate_servers(vec![ServerConfig::stdio("calc", "calc-server").disabled()], &logger);
        assert_eq!(valid.len(), 1);
        assert!(valid[0].disabled);
    }
}
