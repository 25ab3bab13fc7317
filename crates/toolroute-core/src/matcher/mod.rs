//! Tool matching
//!
//! Lexical keyword matching first (cheap, precise), then optional
//! vector-similarity fallback when keyword confidence is too low.

mod keyword;
mod semantic;

pub use keyword::{KeywordIndex, KeywordMatch};
pub use semantic::{
    cosine_similarity, EmbeddingBackend, EmbeddingError, SemanticMatch, SemanticMatcher,
    DEFAULT_SIMILARITY_CUTOFF,
};
