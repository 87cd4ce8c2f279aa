use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ResurfaceMemoriesParams {
    #[schemars(description = "How many memories to resurface. Defaults to 5.")]
    pub count: Option<usize>,
}
