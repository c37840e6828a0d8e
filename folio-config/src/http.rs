//! HTTP client construction for the router's network side.
//!
//! # Example
//! ```no_run
//! use folio_config::HttpSettings;
//! use folio_config::http::{HttpClientParams, build_http_client};
//!
//! let settings = HttpSettings::default();
//! let params = HttpClientParams::from_settings(&settings);
//! let client = build_http_client(params).unwrap();
//! ```
use crate::HttpSettings;
use std::time::Duration;

/// Parameters for configuring an HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientParams<'a> {
    pub timeout: u64,
    pub connect_timeout: u64,
    pub user_agent: &'a str,
}

impl<'a> HttpClientParams<'a> {
    pub fn from_settings(settings: &'a HttpSettings) -> Self {
        Self {
            timeout: settings.timeout,
            connect_timeout: settings.connect_timeout,
            user_agent: &settings.user_agent,
        }
    }
}

/// Builds an HTTP client with the specified parameters.
///
/// Creates a reqwest::Client configured with:
/// - TLS settings
/// - Timeout configurations
/// - User agent
///
/// Redirects are followed by the client, so the router only ever sees final
/// responses.
pub fn build_http_client(
    params: HttpClientParams,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::ClientBuilder::new()
        .use_rustls_tls()
        .timeout(Duration::from_secs(params.timeout))
        .connect_timeout(Duration::from_secs(params.connect_timeout))
        .user_agent(params.user_agent)
        .build()
}
