//! Filesystem implementation of the cache storage traits.
//!
//! Every named store is a directory under the root, named by the SHA-256 of
//! the store name:
//!
//! ```text
//! <root>/<sha256(name)>/store.json          store name and creation time
//! <root>/<sha256(name)>/<sha256(key)>.entry  one JSON metadata line, then the body
//! ```
//!
//! An entry is a single file written to a temporary sibling and renamed into
//! place, so a reader sees either the old entry or the new one, never a mix.
use crate::{
    AbstractCacheStore, CacheError, CacheStorage, CacheStore, CachedResponse,
    RequestKey,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::fs;
use tracing::{debug, info, warn};

const STORE_META: &str = "store.json";
const ENTRY_EXT: &str = "entry";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
struct StoreMeta {
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    key: RequestKey,
    status: u16,
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

fn digest(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CacheError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(
        ".{}.{}.tmp",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

/// Metadata line, newline, body. Compact JSON never contains a raw newline.
fn encode_entry(meta: &EntryMeta, body: &[u8]) -> Result<Vec<u8>, CacheError> {
    let mut data = serde_json::to_vec(meta)?;
    data.push(b'\n');
    data.extend_from_slice(body);
    Ok(data)
}

fn decode_entry(data: Vec<u8>) -> Result<(EntryMeta, Bytes), CacheError> {
    let split = data
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| CacheError::Corrupted("entry without metadata".into()))?;
    let meta = serde_json::from_slice(&data[..split])?;
    let body = Bytes::from(data).slice(split + 1..);
    Ok((meta, body))
}

/// Read a file, mapping "not found" to `None`.
async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, CacheError> {
    match fs::read(path).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Clone)]
pub struct FsCacheStore {
    name: String,
    dir: PathBuf,
}

impl FsCacheStore {
    fn entry_path(&self, key: &RequestKey) -> PathBuf {
        self.dir
            .join(format!("{}.{ENTRY_EXT}", digest(&key.to_string())))
    }
}

#[async_trait]
impl CacheStore for FsCacheStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(
        &self,
        key: &RequestKey,
    ) -> Result<Option<CachedResponse>, CacheError> {
        let Some(raw) = read_optional(&self.entry_path(key)).await? else {
            return Ok(None);
        };
        let (meta, body) = decode_entry(raw)?;
        if meta.key != *key {
            return Err(CacheError::Corrupted(format!(
                "entry for {key} holds {}",
                meta.key
            )));
        }
        Ok(Some(CachedResponse {
            status: meta.status,
            headers: meta.headers,
            body,
        }))
    }

    async fn put(
        &self,
        key: &RequestKey,
        response: CachedResponse,
    ) -> Result<(), CacheError> {
        let meta = EntryMeta {
            key: key.clone(),
            status: response.status,
            headers: response.headers,
            stored_at: Utc::now(),
        };
        write_atomic(&self.entry_path(key), &encode_entry(&meta, &response.body)?)
            .await?;
        debug!(store = %self.name, %key, "cached entry on disk");
        Ok(())
    }

    async fn remove(&self, key: &RequestKey) -> Result<bool, CacheError> {
        match fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, CacheError> {
        let mut keys = Vec::new();
        let mut dir = fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == ENTRY_EXT) {
                continue;
            }
            let Some(raw) = read_optional(&path).await? else {
                continue;
            };
            keys.push(decode_entry(raw)?.0.key);
        }
        Ok(keys)
    }
}

/// Filesystem-backed cache storage rooted at one directory.
#[derive(Debug, Clone)]
pub struct FsCacheStorage {
    root: PathBuf,
}

impl FsCacheStorage {
    /// Create the storage, creating the root directory when missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        // Blocking on purpose: runs once at startup.
        std::fs::create_dir_all(&root)?;
        info!(root = %root.display(), "filesystem cache storage ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, name: &str) -> PathBuf {
        self.root.join(digest(name))
    }

    /// Handle on a store directory without creating anything. Reads from a
    /// directory that is gone come back empty.
    fn store_handle(&self, name: &str) -> FsCacheStore {
        FsCacheStore {
            name: name.to_string(),
            dir: self.store_dir(name),
        }
    }

    async fn read_store_meta(dir: &Path) -> Result<Option<StoreMeta>, CacheError> {
        match read_optional(&dir.join(STORE_META)).await? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CacheStorage for FsCacheStorage {
    async fn open(&self, name: &str) -> Result<AbstractCacheStore, CacheError> {
        let dir = self.store_dir(name);
        if Self::read_store_meta(&dir).await?.is_none() {
            fs::create_dir_all(&dir).await?;
            let meta = StoreMeta {
                name: name.to_string(),
                created_at: Utc::now(),
            };
            write_atomic(&dir.join(STORE_META), &serde_json::to_vec(&meta)?)
                .await?;
            debug!(store = name, "created cache store");
        }
        Ok(Arc::new(self.store_handle(name)))
    }

    async fn has(&self, name: &str) -> Result<bool, CacheError> {
        Ok(Self::read_store_meta(&self.store_dir(name)).await?.is_some())
    }

    async fn names(&self) -> Result<Vec<String>, CacheError> {
        let mut stores = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            match Self::read_store_meta(&entry.path()).await? {
                Some(meta) => stores.push(meta),
                None => warn!(
                    path = %entry.path().display(),
                    "skipping directory without store metadata"
                ),
            }
        }
        stores.sort_by(|a, b| {
            a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name))
        });
        Ok(stores.into_iter().map(|meta| meta.name).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        match fs::remove_dir_all(self.store_dir(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Cross-store lookup that never recreates a store deleted after
    /// `names()` was read.
    async fn lookup(
        &self,
        key: &RequestKey,
    ) -> Result<Option<CachedResponse>, CacheError> {
        for name in self.names().await? {
            if let Some(response) = self.store_handle(&name).lookup(key).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}
