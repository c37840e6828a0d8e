use folio_cache::CacheError;
use folio_config::ConfigError;
use thiserror::Error;

pub type FolioResult<T> = Result<T, FolioError>;

/// The network could not produce a response at all.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network unavailable: {0}")]
    Unavailable(String),

    #[cfg(feature = "http")]
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Network error: {0}")]
    Network(#[from] FetchError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Unexpected status {status} for {url}")]
    BadStatus { url: String, status: u16 },

    #[error("Install failed, core file {url} not cached: {reason}")]
    InstallFailed { url: String, reason: String },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid JSON payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
