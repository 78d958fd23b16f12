//! The key-value seam between the pipeline and its durable store.
//!
//! Values are opaque strings (JSON blobs produced by [`crate::codec`]).
//! Backends must make [`KeyValueStore::set_many`] all-or-nothing: the
//! journal relies on it to flush the log and the entity caches as a unit.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// A durable string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value at `key`, or `None` if unset.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend read fails.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend write fails.
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Read several keys at once. The result is positionally aligned with
    /// `keys`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend read fails.
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError>;

    /// Write several keys atomically. Either every entry lands or none do.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend write fails; in that case no
    /// entry has been written.
    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<(), StoreError>;
}

/// In-process store used for tests and for running without `Dragonfly`.
///
/// Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        let entries = self.entries.read().await;
        Ok(keys.iter().map(|k| entries.get(*k).cloned()).collect())
    }

    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<(), StoreError> {
        // One write guard for the whole batch keeps it atomic for readers.
        let mut guard = self.entries.write().await;
        guard.extend(entries);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_many_is_positional() {
        let store = MemoryStore::new();
        store.set("a", "1".to_owned()).await.unwrap();
        store.set("c", "3".to_owned()).await.unwrap();

        let values = store.get_many(&["a", "b", "c"]).await.unwrap();
        assert_eq!(
            values,
            vec![Some("1".to_owned()), None, Some("3".to_owned())]
        );
    }

    #[tokio::test]
    async fn set_many_overwrites() {
        let store = MemoryStore::new();
        store.set("a", "old".to_owned()).await.unwrap();
        store
            .set_many(vec![
                ("a".to_owned(), "new".to_owned()),
                ("b".to_owned(), "2".to_owned()),
            ])
            .await
            .unwrap();

        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("new"));
        assert_eq!(store.len().await, 2);
    }
}
