//! Request and response model.
//!
//! These are the values that flow between the host, the worker, the network
//! transport and the cache storage. Bodies are [`Bytes`] so that duplicating a
//! response for write-back shares the buffer instead of copying it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// What the requester intends to do with the response.
///
/// Mirrors the fetch standard's request destination. Only `Document` changes
/// worker behavior: it marks a navigation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    #[default]
    Empty,
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    Worker,
    Audio,
    Video,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Empty => "",
            Destination::Document => "document",
            Destination::Script => "script",
            Destination::Style => "style",
            Destination::Image => "image",
            Destination::Font => "font",
            Destination::Manifest => "manifest",
            Destination::Worker => "worker",
            Destination::Audio => "audio",
            Destination::Video => "video",
        }
    }
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "empty" => Ok(Destination::Empty),
            "document" => Ok(Destination::Document),
            "script" => Ok(Destination::Script),
            "style" => Ok(Destination::Style),
            "image" => Ok(Destination::Image),
            "font" => Ok(Destination::Font),
            "manifest" => Ok(Destination::Manifest),
            "worker" => Ok(Destination::Worker),
            "audio" => Ok(Destination::Audio),
            "video" => Ok(Destination::Video),
            other => Err(Error::InvalidInput(format!("unknown destination: {other}"))),
        }
    }
}

/// Origin/visibility class of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response with full visibility.
    Basic,
    /// Cross-origin response the target explicitly shared.
    Cors,
    /// Cross-origin response with no visibility.
    Opaque,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(ResponseType::Basic),
            "cors" => Ok(ResponseType::Cors),
            "opaque" => Ok(ResponseType::Opaque),
            other => Err(Error::CorruptEntry(format!("unknown response type: {other}"))),
        }
    }
}

/// An outbound request issued by a controlled application instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: Url,
    pub method: String,
    pub destination: Destination,
}

impl Request {
    /// Create a request; the method is upper-cased.
    pub fn new(url: Url, method: &str, destination: Destination) -> Self {
        Self { url, method: method.trim().to_ascii_uppercase(), destination }
    }

    /// A plain subresource `GET`.
    pub fn get(url: Url) -> Self {
        Self::new(url, "GET", Destination::Empty)
    }

    /// A top-level document navigation.
    pub fn navigate(url: Url) -> Self {
        Self::new(url, "GET", Destination::Document)
    }

    pub fn is_navigation(&self) -> bool {
        self.destination == Destination::Document
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// The URL used as request identity: fragments never reach the network
    /// and never distinguish cache entries.
    pub fn identity_url(&self) -> Url {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url
    }
}

/// A response as produced by the network or read back from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Final URL after redirects.
    pub url: Url,
    pub status: u16,
    pub response_type: ResponseType,
    /// Header names are stored lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl Response {
    /// Build a response, normalizing header names to lowercase.
    pub fn new(
        url: Url, status: u16, response_type: ResponseType, headers: impl IntoIterator<Item = (String, String)>,
        body: impl Into<Bytes>,
    ) -> Self {
        let headers = headers.into_iter().map(|(k, v)| (k.to_ascii_lowercase(), v)).collect();
        Self { url, status, response_type, headers, body: body.into() }
    }

    /// Status in the 200-299 range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether a network response may be written back into the cache:
    /// exactly 200 and a same-origin basic response.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.response_type == ResponseType::Basic
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// `Vary: *` responses can never be matched again and must not be stored.
    pub fn varies_on_everything(&self) -> bool {
        self.header("vary")
            .map(|v| v.split(',').any(|part| part.trim() == "*"))
            .unwrap_or(false)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}
