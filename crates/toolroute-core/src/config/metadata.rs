//! Persisted tool metadata access
//!
//! Keyword mappings and optional embeddings live in storage owned by an
//! external collaborator (typically a database). The routing core only ever
//! reads them, during the index phase of bring-up.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::traits::ConfigResult;
use crate::types::KeywordMapping;

/// Read access to the persisted keyword-mapping table and tool embeddings
#[async_trait]
pub trait ToolMetadataStore: Send + Sync {
    /// Keyword mapping rows for the given tools
    async fn keyword_mappings(&self, tools: &[String]) -> ConfigResult<Vec<KeywordMapping>>;

    /// Stored embedding vectors keyed by tool name
    ///
    /// The default implementation returns no embeddings; hosts without a
    /// vector store simply skip semantic matching.
    async fn embeddings(&self, _tools: &[String]) -> ConfigResult<HashMap<String, Vec<f32>>> {
        Ok(HashMap::new())
    }
}

/// In-memory metadata store for testing
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    mappings: RwLock<Vec<KeywordMapping>>,
    embeddings: RwLock<HashMap<String, Vec<f32>>>,
}

impl MemoryMetadataStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with initial mappings
    pub fn with_mappings(mappings: Vec<KeywordMapping>) -> Self {
        Self {
            mappings: RwLock::new(mappings),
            embeddings: RwLock::new(HashMap::new()),
        }
    }

    /// Add a mapping row
    pub fn add_mapping(&self, mapping: KeywordMapping) {
        self.mappings.write().push(mapping);
    }

    /// Set the embedding for a tool
    pub fn set_embedding(&self, tool: impl Into<String>, embedding: Vec<f32>) {
        self.embeddings.write().insert(tool.into(), embedding);
    }
}

#[async_trait]
impl ToolMetadataStore for MemoryMetadataStore {
    async fn keyword_mappings(&self, tools: &[String]) -> ConfigResult<Vec<KeywordMapping>> {
        Ok(self
            .mappings
            .read()
            .iter()
            .filter(|m| tools.iter().any(|t| t == &m.tool_name))
            .cloned()
            .collect())
    }

    async fn embeddings(&self, tools: &[String]) -> ConfigResult<HashMap<String, Vec<f32>>> {
        Ok(self
            .embeddings
            .read()
            .iter()
            .filter(|(name, _)| tools.iter().any(|t| t == *name))
            .map(|(name, vec)| (name.clone(), vec.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mappings_filtered_by_tool() {
        let store = MemoryMetadataStore::new();
        store.add_mapping(KeywordMapping::new("solve_equation", "equation", 0.9));
        store.add_mapping(KeywordMapping::new("get_weather", "weather", 0.8));

        let rows = store
            .keyword_mappings(&["solve_equation".to_string()])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].keyword, "equation");
    }

    #[tokio::test]
    async fn test_embeddings_default_empty() {
        struct MappingsOnly;

        #[async_trait]
        impl ToolMetadataStore for MappingsOnly {
            async fn keyword_mappings(&self, _tools: &[String]) -> ConfigResult<Vec<KeywordMapping>> {
                Ok(Vec::new())
            }
        }

        let store = MappingsOnly;
        assert!(store.embeddings(&["t".to_string()]).await.unwrap().is_empty());
    }
}
