//! MCP `search_memories` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `search_memories` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchMemoriesParams {
    /// Free-text query. Queries shorter than 3 characters use substring matching only.
    #[schemars(
        description = "Free-text query. Queries under 3 characters use plain substring matching; longer ones use hybrid semantic + keyword ranking."
    )]
    pub query: String,

    /// Restrict the search to one collection.
    #[schemars(description = "Only search memories in this collection")]
    pub collection: Option<String>,

    /// Maximum number of results to return. Defaults to 20.
    #[schemars(description = "Maximum number of results to return. Defaults to 20.")]
    pub max_results: Option<usize>,
}
