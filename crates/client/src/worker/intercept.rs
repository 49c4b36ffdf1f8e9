//! Fetch event: classification, cache-first lookup, write-back and the
//! offline fallback.

use shellcache_core::policy::classify;
use shellcache_core::{Classification, Error, Request, Response};

use super::CacheWorker;
use super::offline::offline_response;

/// Where a claimed response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Network,
    Offline,
}

/// Result of delivering one fetch event to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not claimed; the host performs its default network handling.
    Passthrough(Classification),
    /// Claimed; this response replaces default handling.
    Respond { response: Response, source: ResponseSource },
}

impl FetchOutcome {
    pub fn is_claimed(&self) -> bool {
        matches!(self, FetchOutcome::Respond { .. })
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Respond { response, .. } => Some(response),
            FetchOutcome::Passthrough(_) => None,
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            FetchOutcome::Respond { source, .. } => Some(*source),
            FetchOutcome::Passthrough(_) => None,
        }
    }
}

impl CacheWorker {
    /// Handle the fetch event for one request.
    ///
    /// Ineligible requests are passed through untouched. Eligible requests
    /// are answered from the current store when possible; otherwise from the
    /// network, writing successful same-origin responses back in the
    /// background.
    ///
    /// # Errors
    ///
    /// When the network fails for a request that is not a navigation and
    /// the cache had nothing, the network error is returned as-is. No
    /// substitute response exists for subresources. Errors that are not
    /// network failures (e.g., an invalid method) are returned for every
    /// destination.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        let classification = classify(&request.identity_url(), &self.config.exclusions);
        if !classification.is_eligible() {
            tracing::debug!(url = %request.url, ?classification, "not intercepted");
            return Ok(FetchOutcome::Passthrough(classification));
        }

        if let Some(response) = self.lookup(request).await {
            tracing::info!(url = %request.url, "cache hit");
            return Ok(FetchOutcome::Respond { response, source: ResponseSource::Cache });
        }

        match self.transport.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.write_back(request, &response).await;
                } else {
                    tracing::debug!(
                        url = %request.url,
                        status = response.status,
                        response_type = %response.response_type,
                        "network response not cacheable"
                    );
                }
                Ok(FetchOutcome::Respond { response, source: ResponseSource::Network })
            }
            Err(e) if request.is_navigation() && e.is_network_failure() => {
                tracing::warn!(url = %request.url, error = %e, "navigation failed; serving offline page");
                let response = offline_response(&request.url, &self.config.app_name);
                Ok(FetchOutcome::Respond { response, source: ResponseSource::Offline })
            }
            Err(e) => {
                tracing::warn!(url = %request.url, destination = request.destination.as_str(), error = %e, "fetch failed with no cached copy");
                Err(e)
            }
        }
    }

    /// Look the request up in the current store. Storage errors count as misses.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.current_store().match_request(request).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed; treating as miss");
                None
            }
        }
    }

    /// Store a duplicate of the response in a detached task.
    ///
    /// Best-effort: the caller already owns the response and never waits
    /// for, or hears about, the outcome of the write.
    async fn write_back(&self, request: &Request, response: &Response) {
        if !request.is_get() {
            tracing::debug!(url = %request.url, method = %request.method, "skipping write-back for non-GET request");
            return;
        }

        let store = self.current_store();
        let request = request.clone();
        let response = response.clone();

        let mut tasks = self.write_backs.lock().await;
        tasks.retain(|task| !task.is_finished());

        tasks.push(tokio::spawn(async move {
            match store.put(&request, &response).await {
                Ok(()) => tracing::debug!(url = %request.url, store = store.name(), "stored network response"),
                Err(e) => tracing::warn!(url = %request.url, store = store.name(), error = %e, "cache write-back failed"),
            }
        }));
    }
}
