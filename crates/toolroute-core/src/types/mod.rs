//! Core types for tool routing
//!
//! This module contains the shared data model used across components.

mod intent;
mod server;
mod status;
mod tool;

pub use intent::IntentResult;
pub use server::{ServerConfig, TransportKind, DEFAULT_TIMEOUT_MS};
pub use status::{InitializationStatus, StatusDetails};
pub use tool::{KeywordMapping, MappingSource, ToolDescriptor};
