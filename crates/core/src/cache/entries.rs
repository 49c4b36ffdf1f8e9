//! Entry operations on one named store.
//!
//! Entries are keyed by request identity. Only `GET` requests can be stored
//! or matched; anything else always misses.

use std::collections::BTreeMap;

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::request::{Request, Response, ResponseType};
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

/// Handle to one named store inside a [`CacheDb`].
#[derive(Clone, Debug)]
pub struct CacheStore {
    db: CacheDb,
    name: String,
}

/// Raw row as read from `cache_entries`.
struct EntryRow {
    status: i64,
    response_type: String,
    response_url: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn into_response(self) -> Result<Response, Error> {
        let url = Url::parse(&self.response_url).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let status = u16::try_from(self.status).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let response_type: ResponseType = self.response_type.parse()?;
        let headers: BTreeMap<String, String> =
            serde_json::from_str(&self.headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;

        Ok(Response { url, status, response_type, headers, body: self.body.into() })
    }
}

impl CacheStore {
    pub(crate) fn new(db: CacheDb, name: &str) -> Self {
        Self { db, name: name.to_string() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the stored response for a request.
    ///
    /// Returns None on a miss, and always for non-GET requests.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }

        let key_hash = compute_cache_key(&request.method, request.identity_url().as_str());
        let store = self.name.clone();

        let row = self
            .db
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, response_type, response_url, headers_json, body
                     FROM cache_entries WHERE store_name = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![store, key_hash], |row| {
                    Ok(EntryRow {
                        status: row.get(0)?,
                        response_type: row.get(1)?,
                        response_url: row.get(2)?,
                        headers_json: row.get(3)?,
                        body: row.get(4)?,
                    })
                });

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::into_response).transpose()
    }

    /// Store a response under the request's identity, replacing any previous
    /// entry for the same identity.
    ///
    /// # Errors
    ///
    /// Returns `Error::PutRejected` for non-GET requests, partial content and
    /// `Vary: *` responses, and a database error if the store has been deleted.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        if !request.is_get() {
            return Err(Error::PutRejected(format!("{} requests cannot be stored", request.method)));
        }
        if response.status == 206 {
            return Err(Error::PutRejected("partial content cannot be stored".into()));
        }
        if response.varies_on_everything() {
            return Err(Error::PutRejected("response carries Vary: *".into()));
        }

        let url = request.identity_url().to_string();
        let key_hash = compute_cache_key(&request.method, &url);
        let method = request.method.clone();
        let store = self.name.clone();
        let status = i64::from(response.status);
        let response_type = response.response_type.as_str();
        let response_url = response.url.to_string();
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let body = response.body.to_vec();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cache_entries (
                        store_name, key_hash, method, url, status, response_type,
                        response_url, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ON CONFLICT(store_name, key_hash) DO UPDATE SET
                        status = excluded.status,
                        response_type = excluded.response_type,
                        response_url = excluded.response_url,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        store,
                        key_hash,
                        method,
                        url,
                        status,
                        response_type,
                        response_url,
                        headers_json,
                        body,
                        stored_at
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Request URLs stored in this store, oldest first.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        let store = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM cache_entries WHERE store_name = ?1 ORDER BY rowid ASC")?;
                let urls = stmt
                    .query_map(params![store], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in this store.
    pub async fn entry_count(&self) -> Result<u64, Error> {
        let store = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM cache_entries WHERE store_name = ?1",
                    params![store],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
