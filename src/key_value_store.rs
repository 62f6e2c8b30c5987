//! In-memory data store shared by every connection.
//!
//! Flat string keys and hash keys live in separate maps, each behind its own
//! read-write lock, so a write to one namespace never waits on the other.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("key '{0}' not found")]
    KeyNotFound(String),
    #[error("field '{field}' not found in key '{key}'")]
    FieldNotFound { key: String, field: String },
}

impl StoreError {
    fn key_not_found(key: &[u8]) -> Self {
        StoreError::KeyNotFound(String::from_utf8_lossy(key).into_owned())
    }

    fn field_not_found(key: &[u8], field: &[u8]) -> Self {
        StoreError::FieldNotFound {
            key: String::from_utf8_lossy(key).into_owned(),
            field: String::from_utf8_lossy(field).into_owned(),
        }
    }
}

/// Operations the command handlers need from a data store.
#[async_trait]
pub trait Store: Send + Sync {
    async fn set(&self, key: Bytes, value: Bytes);

    async fn get(&self, key: &[u8]) -> Result<Bytes, StoreError>;

    async fn hset(&self, key: Bytes, field: Bytes, value: Bytes);

    async fn hget(&self, key: &[u8], field: &[u8]) -> Result<Bytes, StoreError>;

    /// Field/value pairs of a hash in no particular order.
    async fn hgetall(&self, key: &[u8]) -> Result<Vec<(Bytes, Bytes)>, StoreError>;
}

pub type HashValue = HashMap<Bytes, Bytes>;

#[derive(Debug, Default)]
pub struct KeyValueStore {
    strings: RwLock<HashMap<Bytes, Bytes>>,
    hashes: RwLock<HashMap<Bytes, HashValue>>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of flat string keys.
    pub async fn len(&self) -> usize {
        self.strings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0 && self.hash_len().await == 0
    }

    /// Number of hash keys.
    pub async fn hash_len(&self) -> usize {
        self.hashes.read().await.len()
    }
}

#[async_trait]
impl Store for KeyValueStore {
    async fn set(&self, key: Bytes, value: Bytes) {
        self.strings.write().await.insert(key, value);
    }

    async fn get(&self, key: &[u8]) -> Result<Bytes, StoreError> {
        self.strings
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::key_not_found(key))
    }

    async fn hset(&self, key: Bytes, field: Bytes, value: Bytes) {
        self.hashes
            .write()
            .await
            .entry(key)
            .or_default()
            .insert(field, value);
    }

    async fn hget(&self, key: &[u8], field: &[u8]) -> Result<Bytes, StoreError> {
        let hashes_guard = self.hashes.read().await;

        let Some(fields) = hashes_guard.get(key) else {
            return Err(StoreError::key_not_found(key));
        };

        fields
            .get(field)
            .cloned()
            .ok_or_else(|| StoreError::field_not_found(key, field))
    }

    async fn hgetall(&self, key: &[u8]) -> Result<Vec<(Bytes, Bytes)>, StoreError> {
        let hashes_guard = self.hashes.read().await;

        let Some(fields) = hashes_guard.get(key) else {
            return Err(StoreError::key_not_found(key));
        };

        Ok(fields
            .iter()
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect())
    }
}
