//! Routing façade
//!
//! `ToolRouter` wires the orchestrator, connection manager, and resolver
//! together behind the three operations hosts actually call: status,
//! suggestion, and execution. It is the only type most embedders need.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::config::{ServerConfigProvider, ToolMetadataStore};
use crate::logging::SharedLogger;
use crate::manager::ConnectionManager;
use crate::matcher::{
    EmbeddingBackend, KeywordIndex, KeywordMatch, SemanticMatcher, DEFAULT_SIMILARITY_CUTOFF,
};
use crate::resolver::{IntentResolver, ResolverConfig, StructuredParser};
use crate::startup::StartupOrchestrator;
use crate::types::{InitializationStatus, IntentResult};

/// Optional capabilities and tuning for a router
pub struct RouterOptions {
    /// Embedding backend for semantic fallback; absent disables the stage
    pub embedding_backend: Option<Arc<dyn EmbeddingBackend>>,
    /// External structured-language parser; absent disables the stage
    pub structured_parser: Option<Arc<dyn StructuredParser>>,
    /// Resolution thresholds
    pub resolver: ResolverConfig,
    /// Similarity cutoff for semantic matches
    pub semantic_cutoff: f64,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            embedding_backend: None,
            structured_parser: None,
            resolver: ResolverConfig::default(),
            semantic_cutoff: DEFAULT_SIMILARITY_CUTOFF,
        }
    }
}

/// Status snapshot plus its one-line summary
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// The snapshot itself
    pub status: InitializationStatus,
    /// Human-readable summary of the snapshot
    pub message: String,
}

/// Result of one tool execution
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    /// Whether the call returned a result
    pub success: bool,
    /// The tool's result payload, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The failure description, on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The embedder-facing routing context
pub struct ToolRouter {
    orchestrator: Arc<StartupOrchestrator>,
    manager: Arc<ConnectionManager>,
    resolver: IntentResolver,
    index: Arc<parking_lot::RwLock<KeywordIndex>>,
    logger: SharedLogger,
}

impl ToolRouter {
    /// Wire up a router over the given collaborators
    pub fn new(
        servers: Arc<dyn ServerConfigProvider>,
        metadata: Arc<dyn ToolMetadataStore>,
        options: RouterOptions,
        logger: SharedLogger,
    ) -> Self {
        let manager = Arc::new(ConnectionManager::new(logger.clone()));
        let index = Arc::new(parking_lot::RwLock::new(KeywordIndex::new()));

        let orchestrator = Arc::new(StartupOrchestrator::new(
            manager.clone(),
            servers,
            metadata,
            index.clone(),
            logger.clone(),
        ));

        let semantic = SemanticMatcher::new(
            options.embedding_backend,
            options.semantic_cutoff,
            logger.clone(),
        );
        let resolver = IntentResolver::new(
            manager.clone(),
            index.clone(),
            semantic,
            options.structured_parser,
            options.resolver,
            logger.clone(),
        );

        Self { orchestrator, manager, resolver, index, logger }
    }

    /// Run first bring-up (honors the startup delay) and report
    pub async fn start(&self) -> StatusReport {
        let status = self.orchestrator.start().await;
        report(status)
    }

    /// Current status; `force` triggers a fresh bring-up before reporting
    pub async fn status(&self, force: bool) -> StatusReport {
        let status = if force {
            self.orchestrator.initialize(true).await
        } else {
            self.orchestrator.status()
        };
        report(status)
    }

    /// Resolve free text to a tool selection with extracted parameters
    pub async fn resolve(&self, text: &str) -> IntentResult {
        self.resolver.resolve(text).await
    }

    /// Ranked keyword suggestions for the input text
    ///
    /// Returns an empty list, never an error, when no server is connected.
    pub fn suggest(&self, text: &str) -> Vec<KeywordMatch> {
        if self.manager.connected_count() == 0 {
            return Vec::new();
        }
        self.index.read().match_text(text)
    }

    /// Execute a tool by catalogue name
    ///
    /// An unknown tool fails immediately without any transport attempt.
    pub async fn execute(
        &self,
        tool: &str,
        arguments: Value,
        timeout_ms: Option<u64>,
        retry_attempts: Option<u32>,
    ) -> ExecutionOutcome {
        let timeout = timeout_ms.map(Duration::from_millis);
        match self
            .manager
            .call_named_tool(tool, arguments, timeout, retry_attempts)
            .await
        {
            Ok(result) => ExecutionOutcome {
                success: true,
                result: Some(result),
                error: None,
            },
            Err(e) => {
                self.logger.warn(&format!("[ToolRouter] Execution of '{}' failed: {}", tool, e));
                ExecutionOutcome {
                    success: false,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Shut every session down
    pub async fn shutdown(&self) {
        self.manager.disconnect_all().await;
    }
}

fn report(snapshot: Arc<InitializationStatus>) -> StatusReport {
    StatusReport {
        message: snapshot.message(),
        status: (*snapshot).clone(),
    }
}
