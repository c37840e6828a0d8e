//! The network side of the router: one trait, one reqwest-backed
//! implementation behind the `http` feature.
use crate::FetchError;
use async_trait::async_trait;
use folio_cache::{CachedResponse, FetchRequest};
use std::sync::Arc;

/// Anything that can turn a request into a response.
///
/// An `Err` means no response was produced (offline, DNS, refused
/// connection...). HTTP error statuses are regular `Ok` responses.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(
        &self,
        request: &FetchRequest,
    ) -> Result<CachedResponse, FetchError>;
}

pub type AbstractNetwork = Arc<dyn Network>;

#[cfg(feature = "http")]
pub use self::client::HttpNetwork;

#[cfg(feature = "http")]
mod client {
    use super::*;
    use folio_config::{
        HttpSettings,
        http::{HttpClientParams, build_http_client},
    };
    use tracing::trace;

    /// Connection-level headers that must not be replayed from a stored copy.
    const HOP_BY_HOP: &[&str] = &[
        "connection",
        "keep-alive",
        "transfer-encoding",
        "upgrade",
        "proxy-connection",
    ];

    #[derive(Debug, Clone)]
    pub struct HttpNetwork {
        client: reqwest::Client,
    }

    impl HttpNetwork {
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }

        pub fn from_settings(
            settings: &HttpSettings,
        ) -> Result<Self, FetchError> {
            let params = HttpClientParams::from_settings(settings);
            let client = build_http_client(params)?;
            Ok(Self::new(client))
        }
    }

    #[async_trait]
    impl Network for HttpNetwork {
        async fn fetch(
            &self,
            request: &FetchRequest,
        ) -> Result<CachedResponse, FetchError> {
            let mut outgoing = self
                .client
                .request(request.method.clone(), request.url.clone())
                .headers(request.headers.clone());
            if !request.body.is_empty() {
                outgoing = outgoing.body(request.body.clone());
            }
            let response = outgoing.send().await?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter(|(name, _)| !HOP_BY_HOP.contains(&name.as_str()))
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.bytes().await?;
            trace!(url = %request.url, status, bytes = body.len(), "fetched");

            Ok(CachedResponse {
                status,
                headers,
                body,
            })
        }
    }
}
