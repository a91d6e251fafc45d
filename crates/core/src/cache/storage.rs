//! Origin-wide cache storage abstraction.
//!
//! The manager never reaches for a global cache registry; it is handed a
//! `CacheStorage` and every generation it touches goes through it. `CacheDb`
//! is the SQLite implementation; tests wrap it to inject failures.

use async_trait::async_trait;
use url::Url;

use super::connection::CacheDb;
use super::generations::CacheEntry;
use crate::Error;

/// Named cache generations visible across the whole origin.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the generation if absent. Returns true if it was created.
    async fn open(&self, name: &str) -> Result<bool, Error>;

    async fn has(&self, name: &str) -> Result<bool, Error>;

    /// All generation names, oldest first.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Write a batch of entries atomically.
    async fn put_all(&self, name: &str, entries: Vec<CacheEntry>) -> Result<usize, Error>;

    async fn match_url(&self, name: &str, url: &Url) -> Result<Option<CacheEntry>, Error>;

    async fn entry_count(&self, name: &str) -> Result<u64, Error>;

    /// Generation the last successful activation left in control.
    async fn active(&self) -> Result<Option<String>, Error>;

    async fn set_active(&self, name: &str) -> Result<(), Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<bool, Error> {
        self.open_generation(name).await
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.has_generation(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.generation_names().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.delete_generation(name).await
    }

    async fn put_all(&self, name: &str, entries: Vec<CacheEntry>) -> Result<usize, Error> {
        self.put_entries(name, entries).await
    }

    async fn match_url(&self, name: &str, url: &Url) -> Result<Option<CacheEntry>, Error> {
        self.match_entry(name, url).await
    }

    async fn entry_count(&self, name: &str) -> Result<u64, Error> {
        self.count_entries(name).await
    }

    async fn active(&self) -> Result<Option<String>, Error> {
        self.active_generation().await
    }

    async fn set_active(&self, name: &str) -> Result<(), Error> {
        self.set_active_generation(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage() -> Box<dyn CacheStorage> {
        Box::new(CacheDb::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_keys_through_trait_object() {
        let storage = storage().await;
        storage.open("site-v1").await.unwrap();
        storage.open("site-v2").await.unwrap();

        let keys = storage.keys().await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"site-v1".to_string()));
        assert!(keys.contains(&"site-v2".to_string()));
    }

    #[tokio::test]
    async fn test_delete_through_trait_object() {
        let storage = storage().await;
        storage.open("site-v1").await.unwrap();
        assert!(storage.delete("site-v1").await.unwrap());
        assert!(!storage.has("site-v1").await.unwrap());
        assert_eq!(storage.entry_count("site-v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_active_through_trait_object() {
        let storage = storage().await;
        storage.open("site-v1").await.unwrap();
        storage.set_active("site-v1").await.unwrap();
        assert_eq!(storage.active().await.unwrap().as_deref(), Some("site-v1"));
    }
}
