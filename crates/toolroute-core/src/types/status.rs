//! Initialization status snapshot

use serde::{Deserialize, Serialize};

/// Counts backing the status flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDetails {
    /// Servers currently in the Connected state
    #[serde(rename = "connectedServers")]
    pub connected_servers: usize,
    /// Servers present in the validated configuration
    #[serde(rename = "totalServers")]
    pub total_servers: usize,
    /// Tools in the discovered catalogue
    #[serde(rename = "totalTools")]
    pub total_tools: usize,
    /// Keyword mapping rows loaded into the index
    #[serde(rename = "keywordMappings")]
    pub keyword_mappings: usize,
}

/// Snapshot of the bring-up sequence, replaced wholesale on each phase
/// transition so readers never observe a torn update.
///
/// `ready` is derived, not stored independently: the only constructor sets
/// it to the conjunction of the four phase flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializationStatus {
    /// Phase 1: server configuration loaded and validated
    #[serde(rename = "configLoaded")]
    pub config_loaded: bool,
    /// Phase 2: at least one server reached Connected
    #[serde(rename = "serversConnected")]
    pub servers_connected: bool,
    /// Phase 3: the aggregated tool catalogue is non-empty
    #[serde(rename = "toolsLoaded")]
    pub tools_loaded: bool,
    /// Phase 4: every discovered tool has at least one keyword mapping
    #[serde(rename = "keywordsMapped")]
    pub keywords_mapped: bool,
    /// True iff all four phase flags are true
    pub ready: bool,
    /// Explanatory error from the most recent failed phase, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Counts backing the flags
    pub details: StatusDetails,
}

impl InitializationStatus {
    /// Build a snapshot; `ready` is computed from the four flags
    pub fn new(
        config_loaded: bool,
        servers_connected: bool,
        tools_loaded: bool,
        keywords_mapped: bool,
        error: Option<String>,
        details: StatusDetails,
    ) -> Self {
        Self {
            config_loaded,
            servers_connected,
            tools_loaded,
            keywords_mapped,
            ready: config_loaded && servers_connected && tools_loaded && keywords_mapped,
            error,
            details,
        }
    }

    /// Snapshot before any phase has run
    pub fn pending() -> Self {
        Self::new(false, false, false, false, None, StatusDetails::default())
    }

    /// Human-readable one-line summary
    pub fn message(&self) -> String {
        if self.ready {
            format!(
                "ready: {}/{} servers connected, {} tools, {} keyword mappings",
                self.details.connected_servers,
                self.details.total_servers,
                self.details.total_tools,
                self.details.keyword_mappings,
            )
        } else {
            let phase = if !self.config_loaded {
                "loading configuration"
            } else if !self.servers_connected {
                "connecting to servers"
            } else if !self.tools_loaded {
                "discovering tools"
            } else {
                "indexing keywords"
            };
            match &self.error {
                Some(error) => format!("not ready ({phase}): {error}"),
                None => format!("not ready ({phase})"),
            }
        }
    }
}

impl Default for InitializationStatus {
    fn default() -> Self {
        Self::pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_iff_all_flags() {
        // Exhaustive truth table over the four phase flags.
        for bits in 0u8..16 {
            let config = bits & 1 != 0;
            let servers = bits & 2 != 0;
            let tools = bits & 4 != 0;
            let keywords = bits & 8 != 0;
            let status = InitializationStatus::new(
                config,
                servers,
                tools,
                keywords,
                None,
                StatusDetails::default(),
            );
            assert_eq!(status.ready, config && servers && tools && keywords);
        }
    }

    #[test]
    fn test_pending_is_not_ready() {
        let status = InitializationStatus::pending();
        assert!(!status.ready);
        assert!(status.error.is_none());
    }

    #[test]
    fn test_message_names_failed_phase() {
        let status = InitializationStatus::new(
            true,
            false,
            false,
            false,
            Some("all connections refused".to_string()),
            StatusDetails { total_servers: 2, ..Default::default() },
        );
        let message = status.message();
        assert!(message.contains("connecting to servers"));
        assert!(message.contains("all connections refused"));
    }

    #[test]
    fn test_ready_message_carries_counts() {
        let status = InitializationStatus::new(
            true,
            true,
            true,
            true,
            None,
            StatusDetails {
                connected_servers: 1,
                total_servers: 2,
                total_tools: 5,
                keyword_mappings: 12,
            },
        );
        assert!(status.message().starts_with("ready"));
        assert!(status.message().contains("5 tools"));
    }
}
