//! The environment hosting the router.
//!
//! A host owns the things the router can only ask for: taking over from a
//! previous instance, controlling open clients, showing notifications and
//! opening windows.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use url::Url;

/// Lifecycle of one router instance as seen by its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Parsed,
    Installing,
    /// Installed, waiting to take over
    Waiting,
    Active,
    /// Install failed, this instance will never serve
    Redundant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// A system notification built from a push payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
}

#[async_trait]
pub trait WorkerHost: Send + Sync {
    /// Replace any running instance now instead of waiting for clients to close.
    async fn skip_waiting(&self);

    /// Start controlling already-open clients without a reload.
    async fn claim_clients(&self);

    async fn show_notification(&self, notification: Notification);

    async fn close_notification(&self, tag: &str);

    /// Open `url` in a new or existing client window.
    async fn open_window(&self, url: &Url);

    async fn lifecycle_changed(&self, _state: LifecycleState) {}
}

pub type AbstractHost = Arc<dyn WorkerHost>;

#[derive(Debug, Default)]
struct LocalHostState {
    lifecycle: LifecycleState,
    skip_waiting_requested: bool,
    clients_claimed: bool,
    notifications: Vec<Notification>,
    opened_windows: Vec<Url>,
}

/// In-process host used by the local proxy and by tests.
///
/// There is no window system behind it: notifications and window requests are
/// logged and kept for inspection.
#[derive(Debug, Default)]
pub struct LocalHost {
    state: Mutex<LocalHostState>,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lifecycle(&self) -> LifecycleState {
        self.state.lock().await.lifecycle
    }

    pub async fn skip_waiting_requested(&self) -> bool {
        self.state.lock().await.skip_waiting_requested
    }

    pub async fn clients_claimed(&self) -> bool {
        self.state.lock().await.clients_claimed
    }

    /// Notifications currently shown.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.lock().await.notifications.clone()
    }

    pub async fn opened_windows(&self) -> Vec<Url> {
        self.state.lock().await.opened_windows.clone()
    }
}

#[async_trait]
impl WorkerHost for LocalHost {
    async fn skip_waiting(&self) {
        let mut state = self.state.lock().await;
        state.skip_waiting_requested = true;
        if state.lifecycle == LifecycleState::Waiting {
            info!("waiting instance promoted");
        }
    }

    async fn claim_clients(&self) {
        self.state.lock().await.clients_claimed = true;
        info!("clients claimed");
    }

    async fn show_notification(&self, notification: Notification) {
        info!(
            title = %notification.title,
            body = %notification.body,
            tag = %notification.tag,
            "notification"
        );
        let mut state = self.state.lock().await;
        // Same tag replaces the previous notification.
        state.notifications.retain(|n| n.tag != notification.tag);
        state.notifications.push(notification);
    }

    async fn close_notification(&self, tag: &str) {
        self.state.lock().await.notifications.retain(|n| n.tag != tag);
    }

    async fn open_window(&self, url: &Url) {
        info!(%url, "open window");
        self.state.lock().await.opened_windows.push(url.clone());
    }

    async fn lifecycle_changed(&self, state: LifecycleState) {
        info!(?state, "lifecycle");
        self.state.lock().await.lifecycle = state;
    }
}
