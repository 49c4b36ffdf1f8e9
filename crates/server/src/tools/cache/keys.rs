//! cache_keys tool implementation.
//!
//! Lists the request URLs stored in one store.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::CacheWorker;
use shellcache_core::Error;

use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Store to inspect (default: the current version's store).
    #[serde(default)]
    pub name: Option<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheKeysOutput {
    pub name: String,
    pub keys: Vec<String>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(worker: &CacheWorker, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let name = params.name.unwrap_or_else(|| worker.cache_name().to_string());

    if !worker.db().has(&name).await? {
        return Err(Error::StoreNotFound(name).into());
    }

    let keys = worker.db().store(&name).keys().await?;
    json_result(&CacheKeysOutput { name, keys })
}
