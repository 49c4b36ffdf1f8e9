//! Fixtures for tool tests: an in-memory worker behind a fixed-route transport.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rmcp::model::CallToolResult;
use shellcache_client::{CacheWorker, Transport};
use shellcache_core::{AppConfig, CacheDb, Error, Request, Response, ResponseType};

use crate::registration::Registration;

#[derive(Default)]
pub(crate) struct StaticTransport {
    routes: Mutex<HashMap<String, (u16, &'static str)>>,
    offline: AtomicBool,
}

impl StaticTransport {
    pub(crate) fn route(&self, url: &str, status: u16, body: &'static str) {
        self.routes.lock().unwrap().insert(url.to_string(), (status, body));
    }

    pub(crate) fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Transport for StaticTransport {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.identity_url();
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{url}: offline")));
        }

        match self.routes.lock().unwrap().get(url.as_str()) {
            Some((status, body)) => {
                let headers = vec![("Content-Type".to_string(), "text/plain".to_string())];
                Ok(Response::new(url.clone(), *status, ResponseType::Basic, headers, *body))
            }
            None => Err(Error::Network(format!("{url}: connection refused"))),
        }
    }
}

pub(crate) struct Fixture {
    pub worker: Arc<CacheWorker>,
    pub registration: Arc<Registration>,
    pub transport: Arc<StaticTransport>,
}

pub(crate) async fn fixture(precache: &[&str]) -> Fixture {
    let config = AppConfig {
        cache_name: "v1".into(),
        origin: "https://app.test/".into(),
        precache: precache.iter().map(|s| s.to_string()).collect(),
        app_name: "Shop".into(),
        ..Default::default()
    };
    let db = CacheDb::open_in_memory().await.unwrap();
    let transport = Arc::new(StaticTransport::default());
    let registration = Arc::new(Registration::new());
    let worker = Arc::new(CacheWorker::new(config, db, transport.clone(), registration.clone()).unwrap());

    Fixture { worker, registration, transport }
}

/// Parse the JSON text of a successful tool result.
pub(crate) fn output_json(result: &CallToolResult) -> serde_json::Value {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
