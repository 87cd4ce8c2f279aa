//! MCP `memory_insights` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `memory_insights` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MemoryInsightsParams {
    /// Optional collection to mine instead of the whole corpus.
    #[schemars(description = "Optional collection to mine instead of the whole corpus")]
    pub collection: Option<String>,
}
