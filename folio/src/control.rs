//! Remote control messages sent by pages to the running router.
use crate::OfflineRouter;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    SkipWaiting,
    GetVersion,
    CacheChapter { url: String },
    ClearCache,
}

impl ControlMessage {
    /// Parse a raw message; anything without a known `type` is `None`.
    pub fn parse(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReply {
    pub version: String,
}

impl OfflineRouter {
    /// Handle a control message. `reply` is only used by `GET_VERSION`.
    #[instrument(skip_all, fields(message = ?message))]
    pub async fn handle_message(
        &self,
        message: ControlMessage,
        reply: Option<oneshot::Sender<VersionReply>>,
    ) {
        match message {
            ControlMessage::SkipWaiting => self.host.skip_waiting().await,
            ControlMessage::GetVersion => {
                let version = VersionReply {
                    version: self.options.cache_version.clone(),
                };
                match reply {
                    Some(reply) => {
                        if reply.send(version).is_err() {
                            debug!("version requester went away");
                        }
                    }
                    None => debug!("version requested without a reply channel"),
                }
            }
            ControlMessage::CacheChapter { url } => self.cache_chapter(&url).await,
            ControlMessage::ClearCache => {
                match self.storage.delete(&self.options.cache_version).await {
                    Ok(existed) => info!(existed, "cache cleared"),
                    Err(err) => warn!(error = %err, "failed to clear cache"),
                }
            }
        }
    }

    /// Handle a message straight off the wire, ignoring unknown types.
    pub async fn handle_raw_message(
        &self,
        value: &serde_json::Value,
        reply: Option<oneshot::Sender<VersionReply>>,
    ) {
        match ControlMessage::parse(value) {
            Some(message) => self.handle_message(message, reply).await,
            None => debug!(%value, "ignoring unknown control message"),
        }
    }

    async fn cache_chapter(&self, entry: &str) {
        let url = match self.classifier.resolve(entry) {
            Ok(url) => url,
            Err(err) => {
                warn!(url = entry, error = %err, "bad chapter url");
                return;
            }
        };
        match self.add_to_store(&url).await {
            Ok(()) => info!(%url, "chapter cached on request"),
            Err(err) => warn!(%url, error = %err, "chapter not cached"),
        }
    }
}
