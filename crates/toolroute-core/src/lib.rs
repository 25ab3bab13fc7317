//! Toolroute Core
//!
//! Runtime-agnostic tool routing over JSON-RPC tool servers.
//! This crate provides the core functionality that can be used from any
//! environment (native services, CLI hosts, language bindings).
//!
//! ## Routing
//!
//! The `router` module provides the embedder-facing surface:
//! - Bring up configured servers and discover their tools
//! - Resolve free text to a tool selection with extracted parameters
//! - Execute tools with bounded retries
//!
//! ```rust,ignore
//! use toolroute_core::{ToolRouter, RouterOptions};
//!
//! let router = ToolRouter::new(servers, metadata, RouterOptions::default(), logger);
//! router.start().await;
//!
//! // Resolve a request
//! let intent = router.resolve("solve the equation with 32 heads and 94 legs").await;
//!
//! // Execute the selected tool
//! if let Some(tool) = intent.tool_name {
//!     let outcome = router.execute(&tool, intent.parameters.into(), None, None).await;
//! }
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod transport;
pub mod manager;
pub mod startup;
pub mod matcher;
pub mod extract;
pub mod resolver;
pub mod router;

// Re-export commonly used types
pub use types::{
    InitializationStatus, IntentResult, KeywordMapping, MappingSource, ServerConfig,
    StatusDetails, ToolDescriptor, TransportKind,
};

pub use logging::{ConsoleLogger, Logger, NoOpLogger, SharedLogger};

pub use config::{
    ConfigError, ConfigResult, FileServerConfig, MemoryMetadataStore, MemoryServerConfig,
    ServerConfigProvider, ToolMetadataStore,
};

pub use transport::{Transport, TransportError, TransportResult};

pub use manager::{ConnectionManager, ManagerError, ManagerResult, SessionState};

pub use startup::StartupOrchestrator;

pub use matcher::{EmbeddingBackend, KeywordIndex, KeywordMatch, SemanticMatcher};

pub use resolver::{IntentResolver, ResolverConfig, StructuredParse, StructuredParser};

pub use router::{ExecutionOutcome, RouterOptions, StatusReport, ToolRouter};
