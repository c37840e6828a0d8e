use crate::{
    AbstractHost, AbstractNetwork, FetchError, FolioError, FolioResult,
};
use derive_builder::Builder;
use folio_cache::{
    AbstractCacheStorage, AbstractCacheStore, CacheError, CachedResponse,
    FetchRequest, RequestKey,
};
use folio_config::{FolioConfig, NotificationSettings, settings};
use folio_router::{Classifier, DEFAULT_OFFLINE_URL};
use tracing::{debug, warn};
use url::Url;

#[derive(Builder, Clone, Debug)]
#[builder(public, setter(into))]
pub struct RouterOptions {
    /// Name of the store this instance reads from and writes to
    #[builder(default = "settings::DEFAULT_CACHE_VERSION.to_string()")]
    pub cache_version: String,
    #[builder(default = "DEFAULT_OFFLINE_URL.to_string()")]
    pub offline_url: String,
    #[builder(default = "NotificationSettings::default()")]
    pub notification: NotificationSettings,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            cache_version: settings::DEFAULT_CACHE_VERSION.to_string(),
            offline_url: DEFAULT_OFFLINE_URL.to_string(),
            notification: NotificationSettings::default(),
        }
    }
}

impl RouterOptions {
    pub fn from_config(config: &FolioConfig) -> Self {
        Self {
            cache_version: config.worker.cache_version.clone(),
            offline_url: config.worker.offline_url.clone(),
            notification: config.notification.clone(),
        }
    }
}

/// What the host should do with an intercepted request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchDisposition {
    /// Serve this response
    Respond(CachedResponse),
    /// Not routed, send it to the network untouched
    Passthrough,
}

/// The offline cache router.
///
/// Built once at the composition point with every collaborator injected; the
/// event handlers live in `lifecycle`, `strategy`, `control`, `sync` and
/// `push`.
pub struct OfflineRouter {
    pub(crate) options: RouterOptions,
    pub(crate) classifier: Classifier,
    pub(crate) storage: AbstractCacheStorage,
    pub(crate) network: AbstractNetwork,
    pub(crate) host: AbstractHost,
    pub(crate) offline_url: Url,
}

impl std::fmt::Debug for OfflineRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineRouter")
            .field("options", &self.options)
            .field("classifier", &self.classifier)
            .finish()
    }
}

impl OfflineRouter {
    pub fn new(
        options: RouterOptions,
        classifier: Classifier,
        storage: AbstractCacheStorage,
        network: AbstractNetwork,
        host: AbstractHost,
    ) -> FolioResult<Self> {
        let offline_url = classifier.resolve(&options.offline_url)?;
        for ambiguity in classifier.ambiguities() {
            warn!(
                url = %ambiguity.url,
                classes = ?ambiguity.classes,
                "manifest entry matches several request classes, first one wins"
            );
        }
        Ok(Self {
            options,
            classifier,
            storage,
            network,
            host,
            offline_url,
        })
    }

    pub fn from_config(
        config: &FolioConfig,
        storage: AbstractCacheStorage,
        network: AbstractNetwork,
        host: AbstractHost,
    ) -> FolioResult<Self> {
        let classifier = Classifier::new(
            config.worker.origin()?,
            config.manifest(),
            config.worker.core_file_match,
        )?;
        Self::new(
            RouterOptions::from_config(config),
            classifier,
            storage,
            network,
            host,
        )
    }

    pub fn cache_version(&self) -> &str {
        &self.options.cache_version
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn storage(&self) -> &AbstractCacheStorage {
        &self.storage
    }

    /// Send a request straight to the network, bypassing every store.
    pub async fn passthrough(
        &self,
        request: &FetchRequest,
    ) -> Result<CachedResponse, FetchError> {
        self.network.fetch(request).await
    }

    pub(crate) async fn current_store(
        &self,
    ) -> Result<AbstractCacheStore, CacheError> {
        self.storage.open(&self.options.cache_version).await
    }

    /// Write a copy of a network response into the current store. A failed
    /// write is logged and otherwise ignored.
    pub(crate) async fn store_copy(
        &self,
        request: &FetchRequest,
        response: &CachedResponse,
    ) {
        let key = request.key();
        let result = match self.current_store().await {
            Ok(store) => store.put(&key, response.clone()).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => debug!(%key, "stored network copy"),
            Err(err) => warn!(%key, error = %err, "failed to store network copy"),
        }
    }

    /// GET `url` and require an OK status.
    pub(crate) async fn fetch_ok(&self, url: &Url) -> FolioResult<CachedResponse> {
        let response = self.network.fetch(&FetchRequest::get(url.clone())).await?;
        if !response.is_ok() {
            return Err(FolioError::BadStatus {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response)
    }

    /// Fetch `url` and store it in the current store; fails on network
    /// errors and non-OK statuses.
    pub(crate) async fn add_to_store(&self, url: &Url) -> FolioResult<()> {
        let response = self.fetch_ok(url).await?;
        self.current_store()
            .await?
            .put(&RequestKey::get(url), response)
            .await?;
        Ok(())
    }

    /// The stored offline page, or a bare 503 when it was never cached.
    pub(crate) async fn offline_page(&self) -> FolioResult<CachedResponse> {
        let key = RequestKey::get(&self.offline_url);
        Ok(self
            .storage
            .lookup(&key)
            .await?
            .unwrap_or_else(offline_page_missing))
    }
}

pub(crate) fn offline_page_missing() -> CachedResponse {
    CachedResponse::new(503, "Offline")
        .with_header("content-type", "text/plain; charset=utf-8")
}
