//! Typed configuration for the offline router and its local host.
//!
//! Every section is optional; missing fields fall back to the values the book
//! shipped with.
//!
//! ```yaml
//! worker:
//!   cache_version: programming-book-v1.0.0
//!   origin: http://127.0.0.1:8000
//!   offline_url: /offline.html
//!   core_file_match: exact
//! manifest:
//!   chapter_files: [/chapters/chapter1.html]
//!   chapters_file: chapters.txt
//! server:
//!   listen: 127.0.0.1:8080
//! ```
use crate::{ConfigError, Configurable};
use folio_router::{CoreFileMatch, DEFAULT_OFFLINE_URL, Manifest};
use serde::{Deserialize, Serialize};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};
use tracing::debug;
use url::Url;

pub const DEFAULT_CACHE_VERSION: &str = "programming-book-v1.0.0";
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8000/";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Name of the current cache store; bumping it retires older stores
    pub cache_version: String,
    /// Origin the book is served from, `DEFAULT_ORIGIN` when unset
    pub origin: Option<Url>,
    pub offline_url: String,
    pub core_file_match: CoreFileMatch,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            origin: None,
            offline_url: DEFAULT_OFFLINE_URL.to_string(),
            core_file_match: CoreFileMatch::default(),
        }
    }
}

impl WorkerSettings {
    pub fn origin(&self) -> Result<Url, url::ParseError> {
        match &self.origin {
            Some(origin) => Ok(origin.clone()),
            None => Url::parse(DEFAULT_ORIGIN),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestSettings {
    #[serde(flatten)]
    pub lists: Manifest,
    /// Text file with one chapter path per line, relative to the config file
    pub chapters_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub open_title: String,
    pub close_title: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            icon: "/assets/icons/icon-192x192.png".to_string(),
            badge: "/assets/icons/badge-72x72.png".to_string(),
            tag: "programming-book-notification".to_string(),
            open_title: "فتح الكتاب".to_string(),
            close_title: "إغلاق".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Whole-request timeout, seconds
    pub timeout: u64,
    pub connect_timeout: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: 30,
            connect_timeout: 10,
            user_agent: concat!("folio/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub listen: SocketAddr,
    pub cache_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            cache_dir: PathBuf::from(".folio-cache"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Emit JSON lines instead of the human-readable format
    pub json: bool,
    /// Filter directive used when `RUST_LOG` is unset
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub worker: WorkerSettings,
    pub manifest: ManifestSettings,
    pub notification: NotificationSettings,
    pub http: HttpSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    #[serde(skip)]
    raw: serde_yaml::Value,
}

impl Configurable for FolioConfig {
    fn config(&self) -> &serde_yaml::Value {
        &self.raw
    }
}

impl FolioConfig {
    /// Load and finalize configuration from a YAML file.
    ///
    /// A relative `manifest.chapters_file` is resolved against the directory
    /// of the config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = Self::load_config(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_value(raw, base)
    }

    /// Build from an already parsed YAML document.
    pub fn from_value(
        raw: serde_yaml::Value,
        base_dir: &Path,
    ) -> Result<Self, ConfigError> {
        let mut config: FolioConfig = if raw.is_null() {
            FolioConfig::default()
        } else {
            serde_yaml::from_value(raw.clone())?
        };
        config.raw = raw;

        if let Some(chapters_file) = &config.manifest.chapters_file {
            let chapters_path = base_dir.join(chapters_file);
            let chapters = Self::load_list_file(&chapters_path)?;
            debug!(
                count = chapters.len(),
                path = %chapters_path.display(),
                "loaded chapter list"
            );
            config.manifest.lists.extend_chapters(chapters);
        }
        Ok(config)
    }

    /// Manifest with the offline page guaranteed among the core files.
    pub fn manifest(&self) -> Manifest {
        self.manifest
            .lists
            .clone()
            .with_offline_url(&self.worker.offline_url)
    }
}
