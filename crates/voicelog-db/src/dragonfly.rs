//! `Dragonfly` (Redis-compatible) backend for [`KeyValueStore`].
//!
//! Every pipeline key holds one JSON string. Multi-key writes go through
//! `MSET`, which the server applies atomically, so a journal flush either
//! lands in full or not at all.
//!
//! # Key Patterns
//!
//! See [`crate::keys`].

use async_trait::async_trait;
use fred::prelude::*;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
///
/// Wraps a [`fred::prelude::Client`].
#[derive(Clone)]
pub struct DragonflyStore {
    client: Client,
}

impl DragonflyStore {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL cannot be parsed.
    /// Returns [`StoreError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let config = Config::from_url(url)
            .map_err(|e| StoreError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    /// Flush all keys from the `Dragonfly` instance.
    ///
    /// **WARNING:** This deletes all data. Only use for testing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Dragonfly`] if the flush fails.
    pub async fn flush_all(&self) -> Result<(), StoreError> {
        let _: () = self.client.flushall(false).await?;
        Ok(())
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl KeyValueStore for DragonflyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<String> = self.client.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let _: () = self
            .client
            .set(key, value.as_str(), None, None, false)
            .await?;
        Ok(())
    }

    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let owned: Vec<String> = keys.iter().map(|k| (*k).to_owned()).collect();
        let values: Vec<Option<String>> = self.client.mget(owned).await?;
        Ok(values)
    }

    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }
        let count = entries.len();
        let _: () = self.client.mset(entries).await?;
        tracing::debug!(keys = count, "Wrote keys to Dragonfly (MSET)");
        Ok(())
    }
}
