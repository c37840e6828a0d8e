//! # folio
//!
//! Offline cache router for a static, multi-chapter web book.
//!
//! Every request the book makes goes through an [`OfflineRouter`], which
//! classifies it and serves it from a named, versioned cache store or from
//! the network depending on its class, falling back to a dedicated offline
//! page when both fail for pages the reader navigates to.
//!
//! ## Features
//!
//! - **Precache on install**: core files all-or-nothing, chapters best effort.
//! - **Version rollover**: stores of other versions are dropped on activate.
//! - **Per-class strategies**: network-first for pages, chapters and external
//!   resources, cache-first for core files.
//! - **Control messages**: `SKIP_WAITING`, `GET_VERSION`, `CACHE_CHAPTER`,
//!   `CLEAR_CACHE`.
//! - **Background refresh** of the core files and **push notifications**.
//! - **Local proxy** (`server` feature) hosting the router in front of the
//!   book origin.
//!
//! The cache storage, the network and the host are injected as trait objects,
//! so any of them can be swapped for an in-memory fake.
//!
//! ## Modules
//!
//! - `cache`: request identity, stored responses and cache backends.
//! - `config`: YAML configuration.
//! - `routing`: request classification and the precache manifest.
//! - `server`: the hyper proxy host.
pub mod control;
mod error;
pub mod host;
mod lifecycle;
pub mod network;
pub mod observability;
pub mod push;
pub mod router;
#[cfg(feature = "server")]
pub mod server;
mod strategy;
pub mod sync;

pub use control::{ControlMessage, VersionReply};
pub use error::{FetchError, FolioError, FolioResult};
pub use host::{
    AbstractHost, LifecycleState, LocalHost, Notification, NotificationAction,
    WorkerHost,
};
#[cfg(feature = "http")]
pub use network::HttpNetwork;
pub use network::{AbstractNetwork, Network};
pub use push::PushPayload;
pub use router::{
    FetchDisposition, OfflineRouter, RouterOptions, RouterOptionsBuilder,
};
pub use sync::{BACKGROUND_SYNC_TAG, SyncReport};

pub use folio_cache as cache;
pub use folio_config as config;
pub use folio_router as routing;

// re-export
pub use async_trait;
#[cfg(feature = "http")]
pub use reqwest;
pub use serde_json;
pub use tracing;
