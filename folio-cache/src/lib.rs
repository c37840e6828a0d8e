//! Versioned response cache for folio.
//!
//! This crate holds the storage side of the offline router: request identity,
//! stored responses and a trait-based API over named cache stores with
//! pluggable backends.
//!
//! Currently supported backends:
//! - in-memory (`MemoryCacheStorage`), used by tests and short-lived hosts
//! - filesystem (`FsCacheStorage`), one directory per named store
#![warn(clippy::unwrap_used)]

mod cache;
mod error;
mod fs;
mod memory;
mod request;
mod storage;

pub use cache::{CacheEntry, CachedResponse};
pub use error::CacheError;
pub use fs::{FsCacheStorage, FsCacheStore};
pub use memory::{MemoryCacheStorage, MemoryCacheStore};
pub use request::{FetchRequest, RequestKey, RequestMode};
pub use storage::{
    AbstractCacheStorage, AbstractCacheStore, CacheStorage, CacheStore,
};

// Re-export
pub use bytes;
pub use http;
pub use url;
