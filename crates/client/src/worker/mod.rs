//! Cache worker: the install/activate/fetch lifecycle controller.
//!
//! ### Lifecycle
//! - `install` runs once per deployed version: opens the versioned store and
//!   precaches the manifest, then asks the host to activate immediately.
//! - `activate` runs once per cutover: removes every store of an older
//!   version and claims all open application instances.
//! - `handle_fetch` runs for every request of a controlled instance:
//!   classification, then cache-first with write-back, then the offline page
//!   for failed navigations.
//!
//! One `CacheWorker` exists per deployed version. Its configuration is fixed
//! at construction.

pub mod activate;
pub mod install;
pub mod intercept;
pub mod offline;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use futures_util::future::join_all;
use shellcache_core::{AppConfig, CacheDb, CacheStore, Error};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

use crate::fetch::Transport;

pub use activate::{ActivationReport, DeletionFailure};
pub use install::{InstallReport, PrecacheFailure};
pub use intercept::{FetchOutcome, ResponseSource};

/// Lifecycle capabilities the host exposes to the worker.
#[async_trait::async_trait]
pub trait Host: Send + Sync {
    /// Activate this version as soon as installation finishes instead of
    /// waiting for every instance of the previous version to close.
    fn skip_waiting(&self);

    /// Route requests of every open application instance through this
    /// version from now on.
    async fn claim_clients(&self) -> Result<(), Error>;
}

/// The lifecycle controller for one deployed cache version.
///
/// Write-backs run as detached tokio tasks. Dropping the worker does not
/// cancel them; `settle` waits for the ones spawned so far.
pub struct CacheWorker {
    config: AppConfig,
    origin: Url,
    db: CacheDb,
    transport: Arc<dyn Transport>,
    host: Arc<dyn Host>,
    write_backs: Mutex<Vec<JoinHandle<()>>>,
}

impl CacheWorker {
    /// Create a worker for the version described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the configured origin is unusable.
    pub fn new(
        config: AppConfig, db: CacheDb, transport: Arc<dyn Transport>, host: Arc<dyn Host>,
    ) -> Result<Self, Error> {
        let origin = config
            .origin_url()
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;

        Ok(Self { config, origin, db, transport, host, write_backs: Mutex::new(Vec::new()) })
    }

    /// The cache version identifier this worker owns.
    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    /// Application origin that relative request targets resolve against.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// Handle to the current version's store.
    pub fn current_store(&self) -> CacheStore {
        self.db.store(&self.config.cache_name)
    }

    /// Wait for the write-backs spawned so far to finish.
    ///
    /// Never called on the response path; the host calls it before shutdown.
    pub async fn settle(&self) {
        let pending = std::mem::take(&mut *self.write_backs.lock().await);
        for joined in join_all(pending).await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "cache write-back task did not complete");
            }
        }
    }
}
