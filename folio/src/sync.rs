//! Background refresh of the core files.
use crate::OfflineRouter;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

/// Outcome of one background refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub refreshed: usize,
    pub failed: usize,
}

impl OfflineRouter {
    /// Re-fetch every core file and overwrite the stored copy when the
    /// response is OK. Returns `None` for tags other than
    /// [`BACKGROUND_SYNC_TAG`].
    #[instrument(skip_all, fields(tag = %tag))]
    pub async fn handle_sync(&self, tag: &str) -> Option<SyncReport> {
        if tag != BACKGROUND_SYNC_TAG {
            debug!("ignoring sync tag");
            return None;
        }

        let urls = self.classifier.core_urls();
        let results = join_all(urls.iter().map(|url| self.add_to_store(url))).await;
        let mut report = SyncReport::default();
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(()) => report.refreshed += 1,
                Err(err) => {
                    warn!(%url, error = %err, "refresh failed");
                    report.failed += 1;
                }
            }
        }
        info!(
            refreshed = report.refreshed,
            failed = report.failed,
            "background sync done"
        );
        Some(report)
    }
}
