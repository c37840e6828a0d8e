//! In-memory implementation of the cache storage traits. Stores live in an
//! insertion-ordered map so `names()` reports creation order, and every store
//! keeps its entries behind its own lock.
use crate::{
    AbstractCacheStore, CacheEntry, CacheError, CacheStorage, CacheStore,
    CachedResponse, RequestKey,
};
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug)]
pub struct MemoryCacheStore {
    name: String,
    entries: RwLock<IndexMap<RequestKey, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(IndexMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(
        &self,
        key: &RequestKey,
    ) -> Result<Option<CachedResponse>, CacheError> {
        let mut entries = self.entries.write().await;
        Ok(entries.get_mut(key).map(|entry| {
            entry.last_accessed = Utc::now();
            entry.response.clone()
        }))
    }

    async fn put(
        &self,
        key: &RequestKey,
        response: CachedResponse,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry::new(key.clone(), response);
        self.entries.write().await.insert(key.clone(), entry);
        debug!(store = %self.name, %key, "cached entry");
        Ok(())
    }

    async fn remove(&self, key: &RequestKey) -> Result<bool, CacheError> {
        Ok(self.entries.write().await.shift_remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, CacheError> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    stores: RwLock<IndexMap<String, Arc<MemoryCacheStore>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<AbstractCacheStore, CacheError> {
        let mut stores = self.stores.write().await;
        let store = stores
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCacheStore::new(name)))
            .clone();
        Ok(store)
    }

    async fn has(&self, name: &str) -> Result<bool, CacheError> {
        Ok(self.stores.read().await.contains_key(name))
    }

    async fn names(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.stores.read().await.keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        Ok(self.stores.write().await.shift_remove(name).is_some())
    }

    async fn lookup(
        &self,
        key: &RequestKey,
    ) -> Result<Option<CachedResponse>, CacheError> {
        // Snapshot the handles so no storage lock is held across store reads.
        let stores: Vec<_> = self.stores.read().await.values().cloned().collect();
        for store in stores {
            if let Some(response) = store.lookup(key).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}
