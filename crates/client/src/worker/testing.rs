//! In-process transport and host doubles for worker tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use shellcache_core::{AppConfig, CacheDb, Error, Request, Response, ResponseType};

use super::{CacheWorker, Host};
use crate::fetch::Transport;

enum Route {
    Respond { status: u16, response_type: ResponseType, headers: Vec<(String, String)>, body: &'static str },
    Fail,
}

/// Transport answering from a fixed route table. Unknown URLs fail like an
/// unreachable host.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, url: &str, status: u16, response_type: ResponseType, body: &'static str) {
        self.respond_with_headers(url, status, response_type, Vec::new(), body);
    }

    pub(crate) fn respond_with_headers(
        &self, url: &str, status: u16, response_type: ResponseType, headers: Vec<(String, String)>,
        body: &'static str,
    ) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Route::Respond { status, response_type, headers, body });
    }

    pub(crate) fn fail(&self, url: &str) {
        self.routes.lock().unwrap().insert(url.to_string(), Route::Fail);
    }

    pub(crate) fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.identity_url();
        self.calls.lock().unwrap().push(url.to_string());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{url}: offline")));
        }

        match self.routes.lock().unwrap().get(url.as_str()) {
            Some(Route::Respond { status, response_type, headers, body }) => {
                Ok(Response::new(url.clone(), *status, *response_type, headers.clone(), *body))
            }
            Some(Route::Fail) | None => Err(Error::Network(format!("{url}: connection refused"))),
        }
    }
}

/// Host that records lifecycle calls.
#[derive(Default)]
pub(crate) struct RecordingHost {
    skipped: AtomicBool,
    claims: AtomicUsize,
}

impl RecordingHost {
    pub(crate) fn skipped_waiting(&self) -> bool {
        self.skipped.load(Ordering::SeqCst)
    }

    pub(crate) fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Host for RecordingHost {
    fn skip_waiting(&self) {
        self.skipped.store(true, Ordering::SeqCst);
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) fn worker_with(config: AppConfig, db: CacheDb) -> (CacheWorker, Arc<ScriptedTransport>, Arc<RecordingHost>) {
    let transport = Arc::new(ScriptedTransport::new());
    let host = Arc::new(RecordingHost::default());
    let worker = CacheWorker::new(config, db, transport.clone(), host.clone()).unwrap();
    (worker, transport, host)
}

/// Answer every connection on a local port with `200 OK` and `body`.
pub(crate) async fn serve_local(content_type: &'static str, body: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = Arc::new(body);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut chunk = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&chunk[..n]),
                    }
                }

                let status_line = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(status_line.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}
