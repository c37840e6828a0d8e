//! Install and activate.
use crate::{FolioError, FolioResult, LifecycleState, OfflineRouter};
use folio_cache::RequestKey;
use futures::future::{join_all, try_join_all};
use tracing::{info, instrument, warn};

impl OfflineRouter {
    /// Precache the manifest into the current store.
    ///
    /// Core files are all-or-nothing: every one is fetched before anything is
    /// written, and a single failure aborts the install with
    /// [`FolioError::InstallFailed`]. Chapters are best effort.
    #[instrument(skip_all, fields(version = %self.options.cache_version))]
    pub async fn handle_install(&self) -> FolioResult<()> {
        self.host.lifecycle_changed(LifecycleState::Installing).await;
        match self.precache().await {
            Ok(()) => {
                self.host.lifecycle_changed(LifecycleState::Waiting).await;
                self.host.skip_waiting().await;
                info!("install complete");
                Ok(())
            }
            Err(err) => {
                self.host.lifecycle_changed(LifecycleState::Redundant).await;
                Err(err)
            }
        }
    }

    async fn precache(&self) -> FolioResult<()> {
        let store = self.current_store().await?;

        let core_urls = self.classifier.core_urls();
        let responses = try_join_all(core_urls.iter().map(|url| async move {
            self.fetch_ok(url)
                .await
                .map_err(|err| FolioError::InstallFailed {
                    url: url.to_string(),
                    reason: err.to_string(),
                })
        }))
        .await?;
        for (url, response) in core_urls.iter().zip(responses) {
            store.put(&RequestKey::get(url), response).await?;
        }
        info!(count = core_urls.len(), "core files cached");

        let chapter_urls = self.classifier.chapter_urls();
        let results =
            join_all(chapter_urls.iter().map(|url| self.add_to_store(url))).await;
        let mut cached = 0;
        for (url, result) in chapter_urls.iter().zip(results) {
            match result {
                Ok(()) => cached += 1,
                Err(err) => warn!(%url, error = %err, "chapter not cached"),
            }
        }
        info!(cached, total = chapter_urls.len(), "chapters cached");
        Ok(())
    }

    /// Drop every store left by other versions, then take over open clients.
    #[instrument(skip_all, fields(version = %self.options.cache_version))]
    pub async fn handle_activate(&self) -> FolioResult<()> {
        for name in self.storage.names().await? {
            if name != self.options.cache_version {
                self.storage.delete(&name).await?;
                info!(store = %name, "deleted stale cache store");
            }
        }
        self.host.claim_clients().await;
        self.host.lifecycle_changed(LifecycleState::Active).await;
        info!("activated");
        Ok(())
    }
}
