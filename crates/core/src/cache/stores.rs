//! Named store management.
//!
//! A store exists once it has been opened and disappears, entries included,
//! when it is deleted.

use super::connection::CacheDb;
use super::entries::CacheStore;
use crate::Error;
use tokio_rusqlite::params;

impl CacheDb {
    /// Open the store with the given name, creating it if absent.
    pub async fn open_store(&self, name: &str) -> Result<CacheStore, Error> {
        let owned = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        let created = self
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
                    params![owned, created_at],
                )?;
                Ok(inserted > 0)
            })
            .await
            .map_err(Error::from)?;

        if created {
            tracing::debug!(store = name, "created cache store");
        }

        Ok(CacheStore::new(self.clone(), name))
    }

    /// Handle to the named store without creating it.
    ///
    /// Lookups on a missing store miss; writes into it fail.
    pub fn store(&self, name: &str) -> CacheStore {
        CacheStore::new(self.clone(), name)
    }

    /// Whether a store with the given name exists.
    pub async fn has(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of all existing stores, in creation order.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and all of its entries.
    ///
    /// Returns `false` when no such store existed.
    pub async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_once() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("v1").await.unwrap();
        db.open_store("v1").await.unwrap();

        assert_eq!(db.keys().await.unwrap(), vec!["v1"]);
        assert!(db.has("v1").await.unwrap());
        assert!(!db.has("v2").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_handle_does_not_create() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let handle = db.store("v9");
        assert_eq!(handle.name(), "v9");
        assert!(db.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for name in ["b-v1", "a-v2", "c-v3"] {
            db.open_store(name).await.unwrap();
        }
        assert_eq!(db.keys().await.unwrap(), vec!["b-v1", "a-v2", "c-v3"]);
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("v1").await.unwrap();

        assert!(db.delete("v1").await.unwrap());
        assert!(!db.delete("v1").await.unwrap());
        assert!(db.keys().await.unwrap().is_empty());
    }
}
