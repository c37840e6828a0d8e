use crate::{CacheError, CachedResponse, RequestKey};
use async_trait::async_trait;
use std::sync::Arc;

/// A single named store mapping request identity to a stored response.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Name (version string) of this store
    fn name(&self) -> &str;

    /// Get a response from the store
    async fn lookup(
        &self,
        key: &RequestKey,
    ) -> Result<Option<CachedResponse>, CacheError>;

    /// Insert or overwrite a response
    async fn put(
        &self,
        key: &RequestKey,
        response: CachedResponse,
    ) -> Result<(), CacheError>;

    /// Remove one entry, returns whether it existed
    async fn remove(&self, key: &RequestKey) -> Result<bool, CacheError>;

    /// All keys currently held
    async fn keys(&self) -> Result<Vec<RequestKey>, CacheError>;

    /// Check if a request is cached
    async fn contains(&self, key: &RequestKey) -> Result<bool, CacheError> {
        Ok(self.lookup(key).await?.is_some())
    }
}

pub type AbstractCacheStore = Arc<dyn CacheStore>;

/// The set of named stores, kept in creation order.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a store, creating it when absent
    async fn open(&self, name: &str) -> Result<AbstractCacheStore, CacheError>;

    async fn has(&self, name: &str) -> Result<bool, CacheError>;

    /// Names of all stores in creation order
    async fn names(&self) -> Result<Vec<String>, CacheError>;

    /// Drop a store with all its entries, returns whether it existed
    async fn delete(&self, name: &str) -> Result<bool, CacheError>;

    /// Search every store in creation order, first hit wins.
    async fn lookup(
        &self,
        key: &RequestKey,
    ) -> Result<Option<CachedResponse>, CacheError> {
        for name in self.names().await? {
            let store = self.open(&name).await?;
            if let Some(response) = store.lookup(key).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}

pub type AbstractCacheStorage = Arc<dyn CacheStorage>;
