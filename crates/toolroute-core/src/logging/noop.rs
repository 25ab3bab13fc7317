//! Silent logger

use super::traits::Logger;

/// A logger that discards every message
///
/// The default for tests and for hosts that wire their own sink in later.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl NoOpLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for NoOpLogger {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::SharedLogger;
    use std::sync::Arc;

    #[test]
    fn test_usable_as_shared_logger() {
        let logger: SharedLogger = Arc::new(NoOpLogger::new());
        logger.debug("[Test] discarded");
        logger.info("[Test] discarded");
        logger.warn("[Test] discarded");
        logger.error("[Test] discarded");
    }
}
