pub mod config;
#[cfg(feature = "http")]
pub mod http;
pub mod settings;

pub use config::{ConfigError, Configurable};
pub use settings::{
    FolioConfig, HttpSettings, LoggingSettings, ManifestSettings,
    NotificationSettings, ServerSettings, WorkerSettings,
};

#[cfg(feature = "http")]
pub use reqwest;
