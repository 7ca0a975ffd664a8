//! Tool definitions as advertised by a backend's `tools/list`

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Tools advertised by one backend, keyed by tool name
pub type ToolMap = HashMap<String, ToolDefinition>;

/// A single tool definition.
///
/// Only `name` is interpreted by the router; every other member is passed
/// through unmodified, including fields this type does not know about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name (catalog key)
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the tool arguments
    #[serde(
        rename = "inputSchema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub input_schema: Option<serde_json::Value>,
    /// Any additional members the backend sent
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ToolDefinition {
    /// Create a definition with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Builder: set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Build a [`ToolMap`] from a list of definitions.
///
/// Later duplicates replace earlier ones.
pub fn tool_map(tools: impl IntoIterator<Item = ToolDefinition>) -> ToolMap {
    tools.into_iter().map(|t| (t.name.clone(), t)).collect()
}
