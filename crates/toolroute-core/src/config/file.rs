//! File-based server configuration (YAML)
//!
//! Reads a named map of server entries from a YAML file, defaulting to
//! `~/.config/toolroute/servers.yaml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::traits::{ConfigResult, ServerConfigProvider};
use crate::types::ServerConfig;

/// Configuration file structure
///
/// Servers are a named map; the map key becomes `ServerConfig::name`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ServersFile {
    #[serde(default)]
    servers: BTreeMap<String, ServerConfig>,
}

/// File-based server configuration provider
pub struct FileServerConfig {
    path: PathBuf,
}

impl FileServerConfig {
    /// Create a provider reading from a specific path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a provider reading from the default user-level path
    /// (~/.config/toolroute/servers.yaml)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("toolroute").join("servers.yaml"))
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ServerConfigProvider for FileServerConfig {
    async fn load_servers(&self) -> ConfigResult<Vec<ServerConfig>> {
        // A missing file is an empty configuration, not an error.
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let file: ServersFile = serde_yaml::from_str(&content)?;

        Ok(file
            .servers
            .into_iter()
            .map(|(name, mut config)| {
                config.name = name;
                config
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::types::TransportKind;

    #[tokio::test]
    async fn test_load_named_map() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
servers:
  calc:
    transport: stdio
    command: calc-server
    args: ["--quiet"]
  remote:
    transport: http
    url: http://localhost:9000/rpc
    disabled: true
"#
        )
        .unwrap();

        let provider = FileServerConfig::new(file.path());
        let servers = provider.load_servers().await.unwrap();
        assert_eq!(servers.len(), 2);

        let calc = servers.iter().find(|s| s.name == "calc").unwrap();
        assert_eq!(calc.transport, TransportKind::Stdio);
        assert_eq!(calc.args, ["--quiet"]);

        let remote = servers.iter().find(|s| s.name == "remote").unwrap();
        assert!(remote.disabled);
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileServerConfig::new(dir.path().join("does-not-exist.yaml"));
        let servers = provider.load_servers().await.unwrap();
        assert!(servers.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "servers: [not, a, map]").unwrap();

        let provider = FileServerConfig::new(file.path());
        assert!(provider.load_servers().await.is_err());
    }
}
