//! Semantic fallback matcher
//!
//! Vector-similarity search over stored tool embeddings, used only when
//! keyword confidence is too low. The embedding backend is an optional
//! capability: when absent, the stage is skipped and the keyword result
//! stands.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::logging::SharedLogger;
use crate::types::ToolDescriptor;

/// Default similarity cutoff for accepting a semantic match
pub const DEFAULT_SIMILARITY_CUTOFF: f64 = 0.6;

/// Errors from an embedding backend
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding failed: {0}")]
    Failed(String),
}

/// Optional capability that turns text into a fixed-dimension vector
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed one piece of text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// One semantic match above the similarity cutoff
#[derive(Debug, Clone, Serialize)]
pub struct SemanticMatch {
    /// Matched tool
    #[serde(rename = "toolName")]
    pub tool_name: String,
    /// Cosine similarity in [-1, 1]
    pub similarity: f64,
}

/// Cosine similarity over equal-length vectors
///
/// Mismatched lengths or zero-norm vectors yield 0.0 rather than an error;
/// a malformed stored embedding should demote a tool, not break a request.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Vector-similarity search over the tool catalogue
pub struct SemanticMatcher {
    backend: Option<Arc<dyn EmbeddingBackend>>,
    cutoff: f64,
    logger: SharedLogger,
}

impl SemanticMatcher {
    /// Create a matcher; `backend: None` disables the stage entirely
    pub fn new(backend: Option<Arc<dyn EmbeddingBackend>>, cutoff: f64, logger: SharedLogger) -> Self {
        Self { backend, cutoff, logger }
    }

    /// Whether an embedding backend is configured
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Rank tools by similarity to the input, above the cutoff
    ///
    /// Degrades gracefully: no backend, a backend error, or tools without
    /// embeddings all produce an empty result, never a failure.
    pub async fn search(&self, text: &str, tools: &[ToolDescriptor]) -> Vec<SemanticMatch> {
        let backend = match &self.backend {
            Some(backend) => backend,
            None => return Vec::new(),
        };

        let query = match backend.embed(text).await {
            Ok(query) => query,
            Err(e) => {
                self.logger.warn(&format!("[SemanticMatcher] Embedding failed: {}", e));
                return Vec::new();
            }
        };

        let mut matches: Vec<SemanticMatch> = tools
            .iter()
            .filter_map(|tool| {
                let embedding = tool.embedding.as_ref()?;
                let similarity = cosine_similarity(&query, embedding);
                (similarity >= self.cutoff).then(|| SemanticMatch {
                    tool_name: tool.name.clone(),
                    similarity,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.tool_name.cmp(&b.tool_name))
        });
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    struct FixedBackend(Vec<f32>);

    #[async_trait]
    impl EmbeddingBackend for FixedBackend {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(self.0.clone())
        }
    }

    fn test_logger() -> SharedLogger {
        Arc::new(NoOpLogger::new())
    }

    #[test]
    fn test_cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let matcher = SemanticMatcher::new(
            Some(Arc::new(FixedBackend(vec![1.0, 0.0]))),
            0.5,
            test_logger(),
        );
        let tools = vec![
            ToolDescriptor::new("aligned", "", "s").with_embedding(vec![0.9, 0.1]),
            ToolDescriptor::new("orthogonal", "", "s").with_embedding(vec![0.0, 1.0]),
            ToolDescriptor::new("no_embedding", "", "s"),
        ];

        let matches = matcher.search("query", &tools).await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].tool_name, "aligned");
        assert!(matches[0].similarity > 0.9);
    }

    #[tokio::test]
    async fn test_absent_backend_skips_stage() {
        let matcher = SemanticMatcher::new(None, 0.5, test_logger());
        assert!(!matcher.is_available());

        let tools = vec![ToolDescriptor::new("t", "", "s").with_embedding(vec![1.0])];
        assert!(matcher.search("query", &tools).await.is_empty());
    }

    #[tokio::test]
    async fn test_backend_error_degrades_gracefully() {
        struct FailingBackend;

        #[async_trait]
        impl EmbeddingBackend for FailingBackend {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
                Err(EmbeddingError::Failed("model offline".to_string()))
            }
        }

        let matcher = SemanticMatcher::new(Some(Arc::new(FailingBackend)), 0.5, test_logger());
        let tools = vec![ToolDescriptor::new("t", "", "s").with_embedding(vec![1.0])];
        assert!(matcher.search("query", &tools).await.is_empty());
    }
}
