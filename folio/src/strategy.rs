//! Per-class fetch strategies.
use crate::{FetchDisposition, FolioResult, OfflineRouter};
use folio_cache::{CachedResponse, FetchRequest, http::Method};
use folio_router::RequestClass;
use tracing::{debug, error, instrument};

impl OfflineRouter {
    /// Route one intercepted request.
    ///
    /// Only GET over http(s) is routed; everything else comes back as
    /// [`FetchDisposition::Passthrough`]. Errors never escape: a failing
    /// strategy falls back to the offline response for its class.
    #[instrument(skip_all, fields(url = %request.url))]
    pub async fn handle_fetch(&self, request: &FetchRequest) -> FetchDisposition {
        if request.method != Method::GET || !request.is_http() {
            debug!(method = %request.method, "passthrough");
            return FetchDisposition::Passthrough;
        }

        let class = self.classifier.classify(request);
        debug!(%class, "routing");
        let result = match class {
            RequestClass::Navigation => self.navigation(request).await,
            RequestClass::CoreFile => self.cache_first(request).await,
            RequestClass::ChapterFile => self.chapter(request).await,
            RequestClass::ExternalResource => {
                self.network_first(request, true).await
            }
            RequestClass::Other => {
                let same_origin = self.classifier.is_same_origin(&request.url);
                self.network_first(request, same_origin).await
            }
        };

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                error!(%class, error = %err, "strategy failed");
                self.offline_response(request, class).await
            }
        };
        FetchDisposition::Respond(response)
    }

    /// Last resort once a strategy failed.
    async fn offline_response(
        &self,
        request: &FetchRequest,
        class: RequestClass,
    ) -> CachedResponse {
        let fallback: FolioResult<CachedResponse> =
            if class == RequestClass::Navigation {
                self.offline_page().await
            } else {
                self.storage
                    .lookup(&request.key())
                    .await
                    .map(|hit| hit.unwrap_or_else(CachedResponse::not_found))
                    .map_err(Into::into)
            };
        fallback.unwrap_or_else(|err| {
            error!(error = %err, "offline fallback failed");
            crate::router::offline_page_missing()
        })
    }

    async fn navigation(
        &self,
        request: &FetchRequest,
    ) -> FolioResult<CachedResponse> {
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.store_copy(request, &response).await;
                }
                Ok(response)
            }
            Err(err) => {
                debug!(error = %err, "network failed, serving from cache");
                match self.storage.lookup(&request.key()).await? {
                    Some(hit) => Ok(hit),
                    None => self.offline_page().await,
                }
            }
        }
    }

    async fn cache_first(
        &self,
        request: &FetchRequest,
    ) -> FolioResult<CachedResponse> {
        if let Some(hit) = self.storage.lookup(&request.key()).await? {
            debug!("cache hit");
            return Ok(hit);
        }
        let response = self.network.fetch(request).await?;
        if response.is_ok() {
            self.store_copy(request, &response).await;
        }
        Ok(response)
    }

    async fn chapter(
        &self,
        request: &FetchRequest,
    ) -> FolioResult<CachedResponse> {
        match self.network.fetch(request).await {
            Ok(response) if response.is_ok() => {
                self.store_copy(request, &response).await;
                return Ok(response);
            }
            Ok(response) => debug!(status = response.status, "chapter not ok"),
            Err(err) => debug!(error = %err, "network failed"),
        }
        match self.storage.lookup(&request.key()).await? {
            Some(hit) => Ok(hit),
            None => self.offline_page().await,
        }
    }

    /// Network first, stored copy second, empty 404 last.
    async fn network_first(
        &self,
        request: &FetchRequest,
        keep_copy: bool,
    ) -> FolioResult<CachedResponse> {
        match self.network.fetch(request).await {
            Ok(response) => {
                if keep_copy && response.is_ok() {
                    self.store_copy(request, &response).await;
                }
                Ok(response)
            }
            Err(err) => {
                debug!(error = %err, "network failed, serving from cache");
                Ok(self
                    .storage
                    .lookup(&request.key())
                    .await?
                    .unwrap_or_else(CachedResponse::not_found))
            }
        }
    }
}
