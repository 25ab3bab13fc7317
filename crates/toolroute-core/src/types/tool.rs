//! Tool catalogue and keyword mapping types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A discovered tool, as advertised by a connected server
///
/// Created on discovery and refreshed on reindex. Read-only to matchers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name (unique across all servers)
    pub name: String,
    /// Description of what the tool does
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(default, rename = "inputSchema")]
    pub input_schema: Value,
    /// Name of the server that advertised this tool
    #[serde(rename = "serverName")]
    pub server_name: String,
    /// Example invocations, from the persisted catalogue
    #[serde(default)]
    pub examples: Vec<String>,
    /// Embedding vector for semantic matching, if one has been computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl ToolDescriptor {
    /// Create a new tool descriptor
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        server_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: Value::Null,
            server_name: server_name.into(),
            examples: Vec::new(),
            embedding: None,
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Set example invocations
    pub fn with_examples(mut self, examples: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    /// Set the embedding vector
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Where a keyword mapping came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingSource {
    /// Derived by a static rule
    Rule,
    /// Generated by an LLM
    Llm,
    /// Entered by hand
    Manual,
}

impl Default for MappingSource {
    fn default() -> Self {
        MappingSource::Rule
    }
}

/// A persisted tool-to-keyword association
///
/// Many-to-many between tools and keywords, unique on (tool_name, keyword).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordMapping {
    /// Tool this keyword maps to
    #[serde(rename = "toolName")]
    pub tool_name: String,
    /// The keyword itself (stored lowercase)
    pub keyword: String,
    /// Confidence weight in [0, 1]
    pub confidence: f64,
    /// Provenance of the mapping
    #[serde(default)]
    pub source: MappingSource,
}

impl KeywordMapping {
    /// Create a new mapping, clamping confidence into [0, 1]
    pub fn new(tool_name: impl Into<String>, keyword: impl Into<String>, confidence: f64) -> Self {
        Self {
            tool_name: tool_name.into(),
            keyword: keyword.into().to_lowercase(),
            confidence: confidence.clamp(0.0, 1.0),
            source: MappingSource::Rule,
        }
    }

    /// Set the provenance
    pub fn with_source(mut self, source: MappingSource) -> Self {
        self.source = source;
        self
    }
}
