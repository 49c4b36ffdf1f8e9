//! sw_fetch tool implementation.
//!
//! Delivers one fetch event. An active worker answers claimed requests;
//! everything else gets the host's default network handling.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::fetch::resolve;
use shellcache_client::{CacheWorker, FetchOutcome, ResponseSource, Transport};
use shellcache_core::{Destination, Error, Request, Response};

use super::json_result;
use crate::error::HostError;
use crate::registration::{Registration, WorkerState};

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the application origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination; "document" marks a navigation.
    #[serde(default)]
    pub destination: Destination,
}

fn default_method() -> String {
    "GET".into()
}

/// Who produced the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchSource {
    Cache,
    Network,
    Offline,
    /// Not claimed by the worker; fetched by the host directly.
    Passthrough,
}

impl From<ResponseSource> for FetchSource {
    fn from(source: ResponseSource) -> Self {
        match source {
            ResponseSource::Cache => FetchSource::Cache,
            ResponseSource::Network => FetchSource::Network,
            ResponseSource::Offline => FetchSource::Offline,
        }
    }
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize)]
pub struct SwFetchOutput {
    pub url: String,
    pub status: u16,
    /// basic, cors or opaque.
    pub response_type: String,
    pub content_type: Option<String>,
    pub source: FetchSource,
    /// Registration state when the event was delivered.
    pub state: WorkerState,
    pub body: String,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(
    worker: &CacheWorker, registration: &Registration, transport: &dyn Transport, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(HostError::InvalidInput("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(HostError::InvalidInput("method cannot be empty".into()).into());
    }

    let url = resolve(worker.origin(), &params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let request = Request::new(url, params.method.trim(), params.destination);
    let state = registration.state();

    let (response, source) = if state.can_intercept_fetch() {
        match worker.handle_fetch(&request).await? {
            FetchOutcome::Respond { response, source } => (response, FetchSource::from(source)),
            FetchOutcome::Passthrough(classification) => {
                tracing::debug!(url = %request.url, ?classification, "worker passed request through");
                (transport.fetch(&request).await?, FetchSource::Passthrough)
            }
        }
    } else {
        tracing::debug!(url = %request.url, %state, "worker not active; default network handling");
        (transport.fetch(&request).await?, FetchSource::Passthrough)
    };

    json_result(&to_output(response, source, state))
}

fn to_output(response: Response, source: FetchSource, state: WorkerState) -> SwFetchOutput {
    SwFetchOutput {
        url: response.url.to_string(),
        status: response.status,
        response_type: response.response_type.to_string(),
        content_type: response.content_type().map(str::to_string),
        source,
        state,
        body: response.text(),
    }
}
