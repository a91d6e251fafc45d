//! Cache generation CRUD operations.
//!
//! A generation is a named key→response store. Entries are only ever written
//! as a complete batch inside one transaction, so a generation is either empty
//! or holds everything it was provisioned with.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use crate::request::{Request, Response};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

/// A stored response keyed by request URL within one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheEntry {
    pub url: String,
    pub method: String,
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CacheEntry {
    /// Snapshot a network response for the request that produced it.
    pub fn from_response(request: &Request, response: Response) -> Self {
        Self {
            url: request.url.to_string(),
            method: request.method.clone(),
            status_code: response.status,
            headers: response.headers,
            body: response.body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Replay the stored response.
    pub fn into_response(self) -> Response {
        Response { url: self.url, status: self.status_code, headers: self.headers, body: self.body }
    }
}

type EntryRow = (String, String, u16, String, Vec<u8>, String);

fn decode_entry(row: EntryRow) -> Result<CacheEntry, Error> {
    let (url, method, status_code, headers_json, body, stored_at) = row;
    let headers = serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(format!("{url}: {e}")))?;
    Ok(CacheEntry { url, method, status_code, headers, body, stored_at })
}

impl CacheDb {
    /// Create a generation if it doesn't exist.
    ///
    /// Returns true if the generation was created by this call.
    pub async fn open_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(inserted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a generation exists.
    pub async fn has_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// List generation names, oldest first.
    pub async fn generation_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and all of its entries.
    ///
    /// Returns false if no generation had that name.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE generation = ?1", params![name])?;
                let deleted = tx.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Store a batch of entries in one transaction.
    ///
    /// Existing entries with the same URL are overwritten. Fails without
    /// writing anything if the generation does not exist.
    pub async fn put_entries(&self, name: &str, entries: Vec<CacheEntry>) -> Result<usize, Error> {
        let name = name.to_string();
        let rows = entries
            .into_iter()
            .map(|entry| {
                let url = Url::parse(&entry.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", entry.url)))?;
                let headers_json =
                    serde_json::to_string(&entry.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;
                Ok((compute_cache_key(&url), entry, headers_json))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Err(Error::CacheMiss(name));
                }

                for (key_hash, entry, headers_json) in &rows {
                    tx.execute(
                        "INSERT INTO entries (
                            generation, key_hash, url, method, status_code, headers_json, body, stored_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                        ON CONFLICT(generation, key_hash) DO UPDATE SET
                            url = excluded.url,
                            method = excluded.method,
                            status_code = excluded.status_code,
                            headers_json = excluded.headers_json,
                            body = excluded.body,
                            stored_at = excluded.stored_at",
                        params![
                            name,
                            key_hash,
                            &entry.url,
                            &entry.method,
                            entry.status_code,
                            headers_json,
                            &entry.body,
                            &entry.stored_at,
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(rows.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up an entry by URL within one generation.
    pub async fn match_entry(&self, name: &str, url: &Url) -> Result<Option<CacheEntry>, Error> {
        let name = name.to_string();
        let key_hash = compute_cache_key(url);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let result = conn.query_row(
                    "SELECT url, method, status_code, headers_json, body, stored_at
                     FROM entries WHERE generation = ?1 AND key_hash = ?2",
                    params![name, key_hash],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?)),
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(decode_entry).transpose()
    }

    /// Number of entries stored in a generation.
    pub async fn count_entries(&self, name: &str) -> Result<u64, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Name of the generation the last activation left in control.
    ///
    /// `None` on a fresh database, or once that generation has been deleted.
    pub async fn active_generation(&self) -> Result<Option<String>, Error> {
        self.conn
            .call(|conn| -> Result<Option<String>, Error> {
                let result = conn.query_row("SELECT active_generation FROM lifecycle WHERE id = 1", [], |row| {
                    row.get(0)
                });
                match result {
                    Ok(name) => Ok(Some(name)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Record `name` as the active generation, replacing any previous one.
    pub async fn set_active_generation(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Err(Error::CacheMiss(name));
                }
                tx.execute(
                    "INSERT INTO lifecycle (id, active_generation, activated_at) VALUES (1, ?1, ?2)
                     ON CONFLICT(id) DO UPDATE SET
                        active_generation = excluded.active_generation,
                        activated_at = excluded.activated_at",
                    params![name, now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// URLs stored in a generation, in insertion order.
    pub async fn entry_urls(&self, name: &str) -> Result<Vec<String>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE generation = ?1 ORDER BY rowid ASC")?;
                let urls = stmt
                    .query_map(params![name], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}
