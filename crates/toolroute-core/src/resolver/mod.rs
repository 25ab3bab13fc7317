//! Intent resolver
//!
//! Turns free text into an `IntentResult` by running the matching stages
//! in order: keyword index, semantic fallback, optional structured parse.
//! A result below the minimum usable confidence comes back with
//! `needs_tool = false`, which is a normal outcome and never an error.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::extract::ParameterExtractor;
use crate::logging::SharedLogger;
use crate::manager::ConnectionManager;
use crate::matcher::{KeywordIndex, SemanticMatcher};
use crate::types::IntentResult;

/// Confidence thresholds for the resolution pipeline
#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    /// Keyword confidence at or above which the match is accepted outright
    pub high_confidence: f64,
    /// Final confidence below which no tool is selected
    pub min_usable: f64,
    /// Keyword confidence below which the semantic stage is consulted
    pub semantic_trigger: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            high_confidence: 0.8,
            min_usable: 0.3,
            semantic_trigger: 0.5,
        }
    }
}

/// Output of an external structured-language parse
///
/// The fields are opaque hints; the resolver only re-matches their text
/// against the keyword index.
#[derive(Debug, Clone, Default)]
pub struct StructuredParse {
    /// Problem category, e.g. "linear_equation"
    pub kind: Option<String>,
    /// Verb-level intent, e.g. "solve"
    pub intent: Option<String>,
    /// Salient entities pulled from the text
    pub entities: Vec<String>,
}

/// Optional capability backed by an external language parser
#[async_trait]
pub trait StructuredParser: Send + Sync {
    /// Parse the input; `None` means the parser had nothing to offer
    async fn parse(&self, text: &str) -> Option<StructuredParse>;
}

/// A stage's best candidate before acceptance
struct Candidate {
    tool_name: String,
    confidence: f64,
    reasoning: String,
}

/// Multi-stage intent resolution over the live tool catalogue
pub struct IntentResolver {
    manager: Arc<ConnectionManager>,
    index: Arc<RwLock<KeywordIndex>>,
    semantic: SemanticMatcher,
    parser: Option<Arc<dyn StructuredParser>>,
    extractor: ParameterExtractor,
    config: ResolverConfig,
    logger: SharedLogger,
}

impl IntentResolver {
    /// Assemble a resolver over shared manager and index handles
    pub fn new(
        manager: Arc<ConnectionManager>,
        index: Arc<RwLock<KeywordIndex>>,
        semantic: SemanticMatcher,
        parser: Option<Arc<dyn StructuredParser>>,
        config: ResolverConfig,
        logger: SharedLogger,
    ) -> Self {
        let extractor = ParameterExtractor::new(logger.clone());
        Self {
            manager,
            index,
            semantic,
            parser,
            extractor,
            config,
            logger,
        }
    }

    /// Resolve free text to a tool selection with extracted parameters
    pub async fn resolve(&self, text: &str) -> IntentResult {
        let mut candidate = self.keyword_stage(text);

        match candidate {
            Some(c) if c.confidence >= self.config.high_confidence => {
                self.logger.debug(&format!(
                    "[IntentResolver] Accepted '{}' at {:.2} from keywords",
                    c.tool_name, c.confidence
                ));
                return self.accept(text, c);
            }
            other => candidate = other,
        }

        let keyword_confidence = candidate.as_ref().map(|c| c.confidence).unwrap_or(0.0);
        if keyword_confidence < self.config.semantic_trigger {
            if let Some(semantic) = self.semantic_stage(text).await {
                if semantic.confidence > keyword_confidence {
                    candidate = Some(semantic);
                }
            }
        }

        let current = candidate.as_ref().map(|c| c.confidence).unwrap_or(0.0);
        if current < self.config.min_usable {
            if let Some(parsed) = self.structured_stage(text).await {
                if parsed.confidence > current {
                    candidate = Some(parsed);
                }
            }
        }

        match candidate {
            Some(c) if c.confidence >= self.config.min_usable => self.accept(text, c),
            Some(c) => IntentResult::no_tool(format!(
                "best candidate '{}' at {:.2} is below the usable threshold",
                c.tool_name, c.confidence
            )),
            None => IntentResult::no_tool("no matching stage produced a candidate"),
        }
    }

    fn keyword_stage(&self, text: &str) -> Option<Candidate> {
        let matches = self.index.read().match_text(text);
        let best = matches.into_iter().next()?;
        Some(Candidate {
            reasoning: format!(
                "keyword match on [{}] at {:.2}",
                best.matched_keywords.join(", "),
                best.confidence
            ),
            tool_name: best.tool_name,
            confidence: best.confidence,
        })
    }

    async fn semantic_stage(&self, text: &str) -> Option<Candidate> {
        if !self.semantic.is_available() {
            return None;
        }
        let tools = self.manager.list_tools();
        let best = self.semantic.search(text, &tools).await.into_iter().next()?;
        Some(Candidate {
            reasoning: format!(
                "semantic similarity {:.2} to '{}'",
                best.similarity, best.tool_name
            ),
            tool_name: best.tool_name,
            confidence: best.similarity,
        })
    }

    /// Re-match the structured parse's intent and kind text against the
    /// keyword index. The parse itself never picks a tool directly.
    async fn structured_stage(&self, text: &str) -> Option<Candidate> {
        let parser = self.parser.as_ref()?;
        let parsed = parser.parse(text).await?;

        let mut rephrased = String::new();
        for part in parsed
            .intent
            .iter()
            .chain(parsed.kind.iter())
            .chain(parsed.entities.iter())
        {
            rephrased.push_str(part);
            rephrased.push(' ');
        }
        if rephrased.trim().is_empty() {
            return None;
        }

        let best = self.index.read().match_text(&rephrased).into_iter().next()?;
        Some(Candidate {
            reasoning: format!(
                "structured parse ({}) re-matched '{}' at {:.2}",
                parsed.kind.as_deref().unwrap_or("unclassified"),
                best.tool_name,
                best.confidence
            ),
            tool_name: best.tool_name,
            confidence: best.confidence,
        })
    }

    fn accept(&self, text: &str, candidate: Candidate) -> IntentResult {
        let parameters = self
            .manager
            .tool(&candidate.tool_name)
            .map(|tool| self.extractor.extract(text, &tool.input_schema))
            .unwrap_or_default();

        IntentResult::tool(candidate.tool_name, candidate.confidence, candidate.reasoning)
            .with_parameters(parameters)
    }
}
