//! Freshness classification of request URLs.
//!
//! Pure and recomputed per request:
//! - static asset: path ends in an allow-listed extension
//! - content-hashed: an 8+ hex-digit token right before a `.js`/`.css`
//!   extension, or anything under a `/static/` segment
//!
//! Hashed assets never change under the same name and get a long freshness
//! window; other static assets can change across deploys and get a short one.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use swcache_core::AppConfig;
use url::Url;

static STATIC_ASSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(?:js|css|png|jpg|jpeg|svg|gif|webp|ico)$").expect("static asset pattern"));

static HASHED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[a-f0-9]{8,}\.(?:js|css)$").expect("hashed name pattern"));

/// Default window for content-hashed assets: one year.
pub const HASHED_MAX_AGE: u64 = 31_536_000;

/// Default window for mutable static assets: one day.
pub const MUTABLE_MAX_AGE: u64 = 86_400;

/// How long a static asset may be reused without revalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Filename carries a content digest; the bytes behind it never change.
    Hashed,
    /// Same name may serve different bytes after a deploy.
    Mutable,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Freshness::Hashed => "hashed",
            Freshness::Mutable => "mutable",
        }
    }
}

/// Max-age settings for each freshness class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub hashed_max_age: u64,
    pub mutable_max_age: u64,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self { hashed_max_age: HASHED_MAX_AGE, mutable_max_age: MUTABLE_MAX_AGE }
    }
}

impl From<&AppConfig> for FreshnessPolicy {
    fn from(config: &AppConfig) -> Self {
        Self { hashed_max_age: config.hashed_max_age, mutable_max_age: config.mutable_max_age }
    }
}

impl FreshnessPolicy {
    pub fn max_age(&self, freshness: Freshness) -> u64 {
        match freshness {
            Freshness::Hashed => self.hashed_max_age,
            Freshness::Mutable => self.mutable_max_age,
        }
    }

    /// `Cache-Control` value written onto stored entries of this class.
    pub fn cache_control(&self, freshness: Freshness) -> String {
        match freshness {
            Freshness::Hashed => format!("public, max-age={}, immutable", self.hashed_max_age),
            Freshness::Mutable => format!("public, max-age={}", self.mutable_max_age),
        }
    }
}

/// True when the path ends in one of the static-asset extensions.
///
/// The extension match is case-sensitive: `/logo.PNG` is not a static asset.
pub fn is_static_asset(path: &str) -> bool {
    STATIC_ASSET.is_match(path)
}

pub fn is_hashed_asset(path: &str) -> bool {
    HASHED_NAME.is_match(path) || path.contains("/static/")
}

/// Classify a URL. `None` means it is not a static asset at all.
pub fn classify(url: &Url) -> Option<Freshness> {
    classify_path(url.path())
}

pub fn classify_path(path: &str) -> Option<Freshness> {
    if !is_static_asset(path) {
        return None;
    }
    Some(if is_hashed_asset(path) { Freshness::Hashed } else { Freshness::Mutable })
}
