//! MCP `capture_memory` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CaptureMemoryParams {
    #[schemars(description = "The note text, URL, or file name of the memory")]
    pub content: String,

    #[schemars(description = "Memory type: 'note', 'link', 'image', or 'pdf'")]
    pub r#type: String,

    #[schemars(
        description = "Base64-encoded bytes (or a data URL) for 'image' and 'pdf' memories. Not allowed for other types."
    )]
    pub media_payload: Option<String>,
}
