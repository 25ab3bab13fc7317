//! Configuration and persisted-collaborator access
//!
//! The routing core consumes three things from its collaborators: the server
//! configuration list, the persisted keyword-mapping table, and optional
//! per-tool metadata (examples, embeddings). Each is reached through a trait
//! so hosts can plug in their own storage.

mod file;
mod memory;
mod metadata;
mod traits;

pub use file::FileServerConfig;
pub use memory::MemoryServerConfig;
pub use metadata::{MemoryMetadataStore, ToolMetadataStore};
pub use traits::{validate_servers, ConfigError, ConfigResult, ServerConfigProvider};
