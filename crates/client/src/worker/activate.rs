//! Activate event: drop stale versions, then take control.

use futures_util::future::join_all;
use serde::Serialize;
use shellcache_core::Error;

use super::CacheWorker;

/// A stale store that could not be deleted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeletionFailure {
    pub name: String,
    pub reason: String,
}

/// What one activation removed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActivationReport {
    pub cache_name: String,
    pub deleted: Vec<String>,
    pub failed: Vec<DeletionFailure>,
}

impl CacheWorker {
    /// Handle the activate event.
    ///
    /// Deletes every store whose name differs from this version's, waits
    /// for all deletions to settle, then claims every open application
    /// instance. A failed deletion is logged and reported; it does not keep
    /// this version from taking control.
    ///
    /// # Errors
    ///
    /// Returns an error if the store names cannot be listed, the current
    /// store cannot be opened, or the host refuses the claim.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        let current = self.cache_name();
        tracing::info!(cache = %current, "activating");

        self.db.open_store(current).await?;

        let stale: Vec<String> = self
            .db
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != current)
            .collect();

        let deletions = join_all(stale.iter().map(|name| self.db.delete(name))).await;

        let mut report = ActivationReport { cache_name: current.to_string(), deleted: Vec::new(), failed: Vec::new() };

        for (name, outcome) in stale.into_iter().zip(deletions) {
            match outcome {
                Ok(true) => {
                    tracing::info!(store = %name, "deleted stale cache store");
                    report.deleted.push(name);
                }
                Ok(false) => tracing::debug!(store = %name, "stale cache store already gone"),
                Err(e) => {
                    tracing::warn!(store = %name, error = %e, "failed to delete stale cache store");
                    report.failed.push(DeletionFailure { name, reason: e.to_string() });
                }
            }
        }

        self.host.claim_clients().await?;
        tracing::info!(cache = %current, deleted = report.deleted.len(), "activated; controlling all clients");

        Ok(report)
    }
}
