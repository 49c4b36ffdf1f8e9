//! cache_list tool implementation.
//!
//! Lists every store name, current version included.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::{Deserialize, Serialize};
use shellcache_client::CacheWorker;

use crate::tools::json_result;

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheListOutput {
    /// Store owned by the hosted worker version.
    pub current: String,
    /// All store names in creation order.
    pub stores: Vec<String>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(worker: &CacheWorker) -> Result<CallToolResult, McpError> {
    let stores = worker.db().keys().await?;
    json_result(&CacheListOutput { current: worker.cache_name().to_string(), stores })
}
