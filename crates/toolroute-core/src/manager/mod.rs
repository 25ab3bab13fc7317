//! Connection lifecycle management
//!
//! The `ConnectionManager` owns every server session and the discovered
//! tool catalogue. Sessions are never handed out; callers go through the
//! manager for discovery and execution.

mod connection;
mod session;

pub use connection::{ConnectionManager, DEFAULT_CALL_TIMEOUT, DEFAULT_RETRY_ATTEMPTS, RETRY_BACKOFF};
pub use session::{SessionState, SessionSnapshot};

use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced by the connection manager
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Server not found: {0}")]
    ServerNotFound(String),

    #[error("Server not connected: {0}")]
    ServerNotConnected(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type ManagerResult<T> = Result<T, ManagerError>;
