use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListCollectionsParams {
    #[schemars(description = "If set, also return the memories in this collection")]
    pub name: Option<String>,
}
