#![allow(dead_code)]
use async_trait::async_trait;
use folio::cache::{
    AbstractCacheStorage, AbstractCacheStore, CacheError, CacheStorage,
    CacheStore, CachedResponse, FetchRequest, MemoryCacheStorage, RequestKey,
};
use folio::routing::{Classifier, CoreFileMatch, Manifest};
use folio::{
    FetchError, LocalHost, Network, OfflineRouter, RouterOptionsBuilder,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

pub const ORIGIN: &str = "http://book.test/";
pub const VERSION: &str = "programming-book-v2.0.0";

/// Scripted network: known URLs answer with their body, failing URLs and
/// offline mode produce `FetchError::Unavailable`, anything else is a 404.
#[derive(Debug, Default)]
pub struct FakeNetwork {
    responses: Mutex<HashMap<String, CachedResponse>>,
    failing: Mutex<HashSet<String>>,
    offline: Mutex<bool>,
    calls: Mutex<Vec<String>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, response: CachedResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    pub fn respond_ok(&self, url: &str, body: &str) {
        self.respond(url, CachedResponse::new(200, body.to_string()));
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|called| *called == url).count()
    }

    /// Every request seen, headers and body included.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(
        &self,
        request: &FetchRequest,
    ) -> Result<CachedResponse, FetchError> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());
        self.requests.lock().unwrap().push(request.clone());
        let offline = *self.offline.lock().unwrap();
        if offline || self.failing.lock().unwrap().contains(&url) {
            return Err(FetchError::Unavailable(url));
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(CachedResponse::not_found))
    }
}

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub fn body_of(path: &str) -> String {
    format!("<content of {path}>")
}

/// Everything the router talks to, kept around for assertions.
pub struct Harness {
    pub router: Arc<OfflineRouter>,
    pub storage: Arc<MemoryCacheStorage>,
    pub network: Arc<FakeNetwork>,
    pub host: Arc<LocalHost>,
}

/// Network that serves every manifest entry of the default book.
pub fn book_network() -> FakeNetwork {
    let network = FakeNetwork::new();
    let manifest = Manifest::default();
    for path in manifest.core_files.iter().chain(&manifest.chapter_files) {
        network.respond_ok(url(path).as_str(), &body_of(path));
    }
    for external in &manifest.external_resources {
        let external = Url::parse(external).unwrap();
        network.respond_ok(external.as_str(), "font css");
    }
    network
}

fn build_router(
    network: Arc<FakeNetwork>,
    storage: AbstractCacheStorage,
    host: Arc<LocalHost>,
    version: &str,
) -> OfflineRouter {
    let classifier = Classifier::new(
        Url::parse(ORIGIN).unwrap(),
        Manifest::default(),
        CoreFileMatch::Exact,
    )
    .unwrap();
    let options = RouterOptionsBuilder::default()
        .cache_version(version)
        .build()
        .unwrap();
    OfflineRouter::new(options, classifier, storage, network, host).unwrap()
}

pub fn harness_with(
    network: FakeNetwork,
    storage: MemoryCacheStorage,
    version: &str,
) -> Harness {
    let storage = Arc::new(storage);
    let network = Arc::new(network);
    let host = Arc::new(LocalHost::new());
    let router =
        build_router(network.clone(), storage.clone(), host.clone(), version);
    Harness {
        router: Arc::new(router),
        storage,
        network,
        host,
    }
}

pub fn harness() -> Harness {
    harness_with(book_network(), MemoryCacheStorage::new(), VERSION)
}

/// Harness that already went through install and activate.
pub async fn installed_harness() -> Harness {
    let harness = harness();
    harness.router.handle_install().await.unwrap();
    harness.router.handle_activate().await.unwrap();
    harness.network.reset_calls();
    harness
}

/// Switches shared by a `FlakyStorage` and every store it hands out.
#[derive(Debug, Default)]
pub struct Faults {
    reads: AtomicBool,
    writes: AtomicBool,
}

impl Faults {
    fn check(flag: &AtomicBool, what: &str) -> Result<(), CacheError> {
        if flag.load(Ordering::SeqCst) {
            return Err(CacheError::Io(std::io::Error::other(format!(
                "{what} failed"
            ))));
        }
        Ok(())
    }
}

/// In-memory storage whose reads and writes can be made to fail.
#[derive(Debug, Default)]
pub struct FlakyStorage {
    inner: MemoryCacheStorage,
    faults: Arc<Faults>,
}

impl FlakyStorage {
    pub fn fail_reads(&self, fail: bool) {
        self.faults.reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.faults.writes.store(fail, Ordering::SeqCst);
    }

    /// The backing storage, unaffected by faults.
    pub fn inner(&self) -> &MemoryCacheStorage {
        &self.inner
    }
}

struct FlakyStore {
    inner: AbstractCacheStore,
    faults: Arc<Faults>,
}

#[async_trait]
impl CacheStore for FlakyStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn lookup(
        &self,
        key: &RequestKey,
    ) -> Result<Option<CachedResponse>, CacheError> {
        Faults::check(&self.faults.reads, "read")?;
        self.inner.lookup(key).await
    }

    async fn put(
        &self,
        key: &RequestKey,
        response: CachedResponse,
    ) -> Result<(), CacheError> {
        Faults::check(&self.faults.writes, "write")?;
        self.inner.put(key, response).await
    }

    async fn remove(&self, key: &RequestKey) -> Result<bool, CacheError> {
        Faults::check(&self.faults.writes, "write")?;
        self.inner.remove(key).await
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, CacheError> {
        Faults::check(&self.faults.reads, "read")?;
        self.inner.keys().await
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> Result<AbstractCacheStore, CacheError> {
        let inner = self.inner.open(name).await?;
        Ok(Arc::new(FlakyStore {
            inner,
            faults: self.faults.clone(),
        }))
    }

    async fn has(&self, name: &str) -> Result<bool, CacheError> {
        self.inner.has(name).await
    }

    async fn names(&self) -> Result<Vec<String>, CacheError> {
        self.inner.names().await
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        Faults::check(&self.faults.writes, "delete")?;
        self.inner.delete(name).await
    }

    async fn lookup(
        &self,
        key: &RequestKey,
    ) -> Result<Option<CachedResponse>, CacheError> {
        Faults::check(&self.faults.reads, "read")?;
        self.inner.lookup(key).await
    }
}

pub struct FlakyHarness {
    pub router: OfflineRouter,
    pub storage: Arc<FlakyStorage>,
    pub network: Arc<FakeNetwork>,
    pub host: Arc<LocalHost>,
}

/// Default book over a storage whose faults start switched off.
pub fn flaky_harness() -> FlakyHarness {
    let storage = Arc::new(FlakyStorage::default());
    let network = Arc::new(book_network());
    let host = Arc::new(LocalHost::new());
    let router =
        build_router(network.clone(), storage.clone(), host.clone(), VERSION);
    FlakyHarness {
        router,
        storage,
        network,
        host,
    }
}
