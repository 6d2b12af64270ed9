//! Response snapshots and the keys they are stored under.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::hash::compute_cache_key;
use crate::Error;

/// An HTTP response captured in full: status, headers and body.
///
/// This is both what the network layer hands back and what a partition
/// stores, so a cached copy and a fresh copy are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ResponseSnapshot {
    /// URL the response was served for, after redirects.
    pub url: String,
    pub status: u16,
    pub status_text: String,
    /// Header pairs in arrival order. Names compare case-insensitively.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ResponseSnapshot {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { url: url.into(), status, status_text: String::new(), headers: Vec::new(), body: body.into() }
    }

    /// Builder-style header append.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every value of `name` with a single `value`.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Normalized request identity: uppercase method plus canonical URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    /// Build a key from an already parsed URL. The fragment never takes part in identity.
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method: method.to_ascii_uppercase(), url: url.to_string() }
    }

    /// Shorthand for GET, the only method this cache stores.
    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }

    pub fn parse(method: &str, url: &str) -> Result<Self, Error> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        Ok(Self::new(method, &parsed))
    }

    /// SHA-256 hex of the identity, used as the storage key.
    pub fn hash(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

/// One stored response within a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheEntry {
    pub key: RequestKey,
    pub response: ResponseSnapshot,
    /// RFC 3339 timestamp of the write.
    pub stored_at: String,
}

impl CacheEntry {
    pub fn new(key: RequestKey, response: ResponseSnapshot) -> Self {
        Self { key, response, stored_at: Utc::now().to_rfc3339() }
    }

    pub fn stored_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.stored_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}
