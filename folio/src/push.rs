//! Push notifications and notification clicks.
use crate::{FolioResult, Notification, NotificationAction, OfflineRouter};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

pub const OPEN_ACTION: &str = "open";
pub const CLOSE_ACTION: &str = "close";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushPayload {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl OfflineRouter {
    /// Build and show a notification from a push payload.
    ///
    /// A push without payload is ignored. A payload that is not a JSON
    /// object with a `title` is an error.
    #[instrument(skip_all)]
    pub async fn handle_push(
        &self,
        data: Option<&[u8]>,
    ) -> FolioResult<Option<Notification>> {
        let Some(data) = data else {
            debug!("push without payload");
            return Ok(None);
        };
        let payload: PushPayload = serde_json::from_slice(data)?;

        let settings = &self.options.notification;
        let notification = Notification {
            title: payload.title,
            body: payload.body,
            icon: settings.icon.clone(),
            badge: settings.badge.clone(),
            tag: settings.tag.clone(),
            require_interaction: true,
            actions: vec![
                NotificationAction {
                    action: OPEN_ACTION.to_string(),
                    title: settings.open_title.clone(),
                },
                NotificationAction {
                    action: CLOSE_ACTION.to_string(),
                    title: settings.close_title.clone(),
                },
            ],
        };
        self.host.show_notification(notification.clone()).await;
        Ok(Some(notification))
    }

    /// Close the notification; the `open` action also opens the book root.
    #[instrument(skip_all, fields(action = ?action))]
    pub async fn handle_notification_click(&self, action: Option<&str>) {
        self.host.close_notification(&self.options.notification.tag).await;
        if action != Some(OPEN_ACTION) {
            return;
        }
        match self.classifier.resolve("/") {
            Ok(root) => self.host.open_window(&root).await,
            Err(err) => warn!(error = %err, "cannot resolve book root"),
        }
    }
}
