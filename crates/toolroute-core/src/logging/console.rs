//! Console logger
//!
//! Info goes to stdout, everything else to stderr, so a host piping a
//! tool server's own stdout never mixes the two.

use super::traits::Logger;

/// Logs to the process console with a fixed prefix
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    /// Create a logger with the default `[Toolroute]` prefix
    pub fn new() -> Self {
        Self::with_prefix("[Toolroute]")
    }

    /// Create a logger with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        eprintln!("{} DEBUG: {}", self.prefix, message);
    }

    fn info(&self, message: &str) {
        println!("{} INFO: {}", self.prefix, message);
    }

    fn warn(&self, message: &str) {
        eprintln!("{} WARN: {}", self.prefix, message);
    }

    fn error(&self, message: &str) {
        eprintln!("{} ERROR: {}", self.prefix, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert_eq!(ConsoleLogger::new().prefix, "[Toolroute]");
        assert_eq!(ConsoleLogger::with_prefix("[RouterHost]").prefix, "[RouterHost]");
        assert_eq!(ConsoleLogger::default().prefix, "[Toolroute]");
    }

    #[test]
    fn test_levels_do_not_panic() {
        let logger = ConsoleLogger::with_prefix("[Check]");
        logger.debug("connection opened");
        logger.info("1 server connected");
        logger.warn("tool has no keyword mappings");
        logger.error("handshake failed");
    }
}
