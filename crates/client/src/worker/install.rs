//! Install event: open the versioned store and precache the manifest.

use futures_util::future::join_all;
use serde::Serialize;
use shellcache_core::{CacheStore, Error, Request};

use super::CacheWorker;
use crate::fetch::resolve;

/// A manifest entry that could not be precached.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PrecacheFailure {
    pub url: String,
    pub reason: String,
}

/// What one install attempt stored.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstallReport {
    pub cache_name: String,
    /// Resolved URLs that are now in the store.
    pub precached: Vec<String>,
    pub failed: Vec<PrecacheFailure>,
}

impl CacheWorker {
    /// Handle the install event.
    ///
    /// Every manifest entry is fetched and stored independently; failed
    /// entries are logged and reported but never fail the install. The host
    /// is told to skip waiting once population has been attempted, whatever
    /// its outcome.
    ///
    /// # Errors
    ///
    /// Returns an error only if the versioned store itself cannot be opened.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        tracing::info!(cache = %self.cache_name(), entries = self.config.precache.len(), "installing");

        let result = self.populate().await;
        self.host.skip_waiting();

        result
    }

    async fn populate(&self) -> Result<InstallReport, Error> {
        let store = self.db.open_store(self.cache_name()).await?;

        let attempts = self
            .config
            .precache
            .iter()
            .map(|entry| self.precache_entry(&store, entry));
        let outcomes = join_all(attempts).await;

        let mut report =
            InstallReport { cache_name: self.cache_name().to_string(), precached: Vec::new(), failed: Vec::new() };

        for (entry, outcome) in self.config.precache.iter().zip(outcomes) {
            match outcome {
                Ok(url) => report.precached.push(url),
                Err(e) => {
                    tracing::warn!(entry = %entry, error = %e, "precache entry skipped");
                    report.failed.push(PrecacheFailure { url: entry.clone(), reason: e.to_string() });
                }
            }
        }

        tracing::info!(
            cache = %report.cache_name,
            precached = report.precached.len(),
            failed = report.failed.len(),
            "install finished"
        );

        Ok(report)
    }

    /// Fetch one manifest entry and store it. Only 2xx responses count.
    async fn precache_entry(&self, store: &CacheStore, entry: &str) -> Result<String, Error> {
        let url = resolve(&self.origin, entry).map_err(|e| Error::InvalidUrl(format!("{entry}: {e}")))?;
        let request = Request::get(url);

        let response = self.transport.fetch(&request).await?;
        if !response.ok() {
            return Err(Error::HttpError(format!("{} returned status {}", request.url, response.status)));
        }

        store.put(&request, &response).await?;
        Ok(request.url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::worker_with;
    use shellcache_core::{AppConfig, CacheDb, ResponseType};
    use url::Url;

    fn config(precache: &[&str]) -> AppConfig {
        AppConfig {
            cache_name: "v1".into(),
            origin: "https://app.test/shop/".into(),
            precache: precache.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_install_precaches_manifest() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (worker, net, host) = worker_with(config(&["/shop/", "index.html", "manifest.json"]), db.clone());
        net.respond("https://app.test/shop/", 200, ResponseType::Basic, "<html>");
        net.respond("https://app.test/shop/index.html", 200, ResponseType::Basic, "<html>");
        net.respond("https://app.test/shop/manifest.json", 200, ResponseType::Basic, "{}");

        let report = worker.install().await.unwrap();

        assert_eq!(
            report.precached,
            vec![
                "https://app.test/shop/",
                "https://app.test/shop/index.html",
                "https://app.test/shop/manifest.json"
            ]
        );
        assert!(report.failed.is_empty());
        assert!(host.skipped_waiting());
        assert_eq!(worker.current_store().entry_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_install_tolerates_failed_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (worker, net, host) = worker_with(config(&["/shop/", "/shop/missing.json", "/shop/down.css"]), db);
        net.respond("https://app.test/shop/", 200, ResponseType::Basic, "<html>");
        net.respond("https://app.test/shop/missing.json", 404, ResponseType::Basic, "not found");
        net.fail("https://app.test/shop/down.css");

        let report = worker.install().await.unwrap();

        assert_eq!(report.precached, vec!["https://app.test/shop/"]);
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed[0].reason.contains("HTTP_ERROR"));
        assert!(report.failed[1].reason.contains("NETWORK_ERROR"));
        assert!(host.skipped_waiting());

        let stored = worker.current_store().keys().await.unwrap();
        assert_eq!(stored, vec!["https://app.test/shop/"]);
    }

    #[tokio::test]
    async fn test_install_fully_offline_still_succeeds() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (worker, net, host) = worker_with(config(&["/shop/", "/shop/index.html"]), db.clone());
        net.go_offline();

        let report = worker.install().await.unwrap();

        assert!(report.precached.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert!(host.skipped_waiting());
        assert_eq!(db.keys().await.unwrap(), vec!["v1"]);
    }

    #[tokio::test]
    async fn test_install_stores_non_basic_ok_responses() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (worker, net, _host) = worker_with(config(&["https://cdn.test/lib.js"]), db);
        net.respond("https://cdn.test/lib.js", 200, ResponseType::Cors, "lib");

        let report = worker.install().await.unwrap();

        assert_eq!(report.precached, vec!["https://cdn.test/lib.js"]);
        let request = shellcache_core::Request::get(Url::parse("https://cdn.test/lib.js").unwrap());
        let hit = worker.current_store().match_request(&request).await.unwrap().unwrap();
        assert_eq!(hit.response_type, ResponseType::Cors);
    }

    #[tokio::test]
    async fn test_install_twice_is_harmless() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (worker, net, _host) = worker_with(config(&["/shop/"]), db.clone());
        net.respond("https://app.test/shop/", 200, ResponseType::Basic, "<html>");

        worker.install().await.unwrap();
        worker.install().await.unwrap();

        assert_eq!(db.keys().await.unwrap(), vec!["v1"]);
        assert_eq!(worker.current_store().entry_count().await.unwrap(), 1);
    }
}
