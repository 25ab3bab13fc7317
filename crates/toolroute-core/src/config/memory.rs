//! In-memory server configuration provider

use async_trait::async_trait;
use parking_lot::RwLock;

use super::traits::{ConfigResult, ServerConfigProvider};
use crate::types::ServerConfig;

/// In-memory server configuration provider for testing
#[derive(Debug, Default)]
pub struct MemoryServerConfig {
    servers: RwLock<Vec<ServerConfig>>,
}

impl MemoryServerConfig {
    /// Create a new empty provider
    pub fn new() -> Self {
        Self {
            servers: RwLock::new(Vec::new()),
        }
    }

    /// Create a provider with initial servers
    pub fn with_servers(servers: Vec<ServerConfig>) -> Self {
        Self {
            servers: RwLock::new(servers),
        }
    }

    /// Replace the server list
    pub fn set_servers(&self, servers: Vec<ServerConfig>) {
        *self.servers.write() = servers;
    }

    /// Remove all servers
    pub fn clear(&self) {
        self.servers.write().clear();
    }
}

#[async_trait]
impl ServerConfigProvider for MemoryServerConfig {
    async fn load_servers(&self) -> ConfigResult<Vec<ServerConfig>> {
        Ok(self.servers.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_provider_round_trip() {
        let provider = MemoryServerConfig::new();
        assert!(provider.load_servers().await.unwrap().is_empty());

        provider.set_servers(vec![ServerConfig::stdio("calc", "calc-server")]);
        let servers = provider.load_servers().await.unwrap();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].name, "calc");

        provider.clear();
        assert!(provider.load_servers().await.unwrap().is_empty());
    }
}
