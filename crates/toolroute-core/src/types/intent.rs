//! Intent resolution result type

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The outcome of resolving a free-text request against the tool catalogue
///
/// Transient, produced per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentResult {
    /// Whether a tool should be invoked at all
    #[serde(rename = "needsTool")]
    pub needs_tool: bool,
    /// The chosen tool, when `needs_tool` is true
    #[serde(rename = "toolName", skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Matching confidence in [0, 1]
    pub confidence: f64,
    /// Extracted arguments for the chosen tool
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Which stage and which signals decided the match
    pub reasoning: String,
}

impl IntentResult {
    /// A low-confidence / no-match result (a normal outcome, not an error)
    pub fn no_tool(reasoning: impl Into<String>) -> Self {
        Self {
            needs_tool: false,
            tool_name: None,
            confidence: 0.0,
            parameters: Map::new(),
            reasoning: reasoning.into(),
        }
    }

    /// An accepted tool match
    pub fn tool(name: impl Into<String>, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            needs_tool: true,
            tool_name: Some(name.into()),
            confidence: confidence.clamp(0.0, 1.0),
            parameters: Map::new(),
            reasoning: reasoning.into(),
        }
    }

    /// Attach extracted parameters
    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }
}
