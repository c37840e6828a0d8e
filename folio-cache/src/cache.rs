use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RequestKey;

/// A response as kept in a cache store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers in the order they were received
    pub headers: Vec<(String, String)>,
    /// The response body
    pub body: Bytes,
}

impl CachedResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Empty-bodied 404, served when neither network nor store can answer.
    pub fn not_found() -> Self {
        Self::new(404, Bytes::new())
    }

    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Status in the 200-299 range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with a case-insensitive name match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A stored response together with its bookkeeping fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: RequestKey,
    pub response: CachedResponse,
    /// When this entry was (last) written
    pub stored_at: DateTime<Utc>,
    /// When this entry was last read or written
    pub last_accessed: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: RequestKey, response: CachedResponse) -> Self {
        let now = Utc::now();
        Self {
            key,
            response,
            stored_at: now,
            last_accessed: now,
        }
    }
}
