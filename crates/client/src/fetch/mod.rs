//! Network transport.
//!
//! ### Transport capability
//! - [`Transport`] is the only way the worker reaches the network: "fetch a
//!   request, get a response with status/type/body, or fail".
//! - A failure means no response was obtainable at all. Error statuses
//!   (404, 500, ...) are responses, not failures.
//!
//! ### Response type
//! - `basic` when both the request and the final URL share the application
//!   origin.
//! - `cors` when a cross-origin server shares the response with the
//!   application origin via `Access-Control-Allow-Origin`.
//! - `opaque` otherwise.
//!
//! ### Limits
//! - Max redirects: 5
//! - Request timeout: 20s (configurable)
//! - Bodies are read whole; no size cap is applied

pub mod url;

use bytes::Bytes;
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, resolve};

use shellcache_core::{AppConfig, Destination, Error, Request, Response, ResponseType};

/// The network capability consumed by the worker.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Issue the request over the network.
    ///
    /// Returns `Err` only when no response could be obtained.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Application origin; decides which responses are `basic`.
    pub origin: ::url::Url,

    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl FetchConfig {
    /// Default limits for the given application origin.
    pub fn new(origin: ::url::Url) -> Self {
        Self {
            origin,
            user_agent: "shellcache/0.1".to_string(),
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }

    /// Build the fetch configuration from the application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = config
            .origin_url()
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;

        Ok(Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            ..Self::new(origin)
        })
    }
}

/// Accept header sent for a request destination.
fn accept_for(destination: Destination) -> &'static str {
    match destination {
        Destination::Document => "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        Destination::Style => "text/css,*/*;q=0.1",
        Destination::Image => "image/avif,image/webp,image/*,*/*;q=0.8",
        Destination::Manifest => "application/manifest+json,application/json;q=0.9,*/*;q=0.8",
        _ => "*/*",
    }
}

/// Classify a network response relative to the application origin.
pub fn response_type_for(
    origin: &::url::Url, request_url: &::url::Url, final_url: &::url::Url, headers: &header::HeaderMap,
) -> ResponseType {
    let app = origin.origin();
    if request_url.origin() == app && final_url.origin() == app {
        return ResponseType::Basic;
    }

    let allowed = headers
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);

    match allowed {
        Some("*") => ResponseType::Cors,
        Some(value) if value.trim_end_matches('/') == app.ascii_serialization() => ResponseType::Cors,
        _ => ResponseType::Opaque,
    }
}

/// Flatten a header map, joining repeated headers with ", ".
fn flatten_headers(headers: &header::HeaderMap) -> Vec<(String, String)> {
    let mut flat: Vec<(String, String)> = Vec::with_capacity(headers.keys_len());
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join(", ");
        flat.push((name.as_str().to_string(), joined));
    }
    flat
}

/// reqwest-backed [`Transport`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }
}

#[async_trait::async_trait]
impl Transport for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let url = request.identity_url();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let response = self
            .http
            .request(method, url.clone())
            .header(header::ACCEPT, accept_for(request.destination))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::FetchTimeout(format!("{} after {}ms", url, self.config.timeout.as_millis()))
                } else {
                    Error::Network(format!("{}: {}", url, e))
                }
            })?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let bytes: Bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        let response_type = response_type_for(&self.config.origin, &url, &final_url, &headers);
        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} {} -> {} ({}, {}) in {}ms ({} bytes)",
            request.method,
            url,
            final_url,
            status,
            response_type,
            fetch_ms,
            bytes.len()
        );

        Ok(Response::new(final_url, status, response_type, flatten_headers(&headers), bytes))
    }
}
