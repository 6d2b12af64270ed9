//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::PartitionKind;

mod validation;

pub use validation::ConfigError;

/// Which partition store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Sqlite,
    Memory,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Build version the worker serves. Partition names are derived from it.
    ///
    /// Set via SWCACHE_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Origin and path the worker controls. Seed assets resolve against it.
    ///
    /// Set via SWCACHE_SCOPE environment variable.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Partition store backend.
    ///
    /// Set via SWCACHE_STORE environment variable (`sqlite` or `memory`).
    #[serde(default)]
    pub store: StoreKind,

    /// Path to SQLite cache database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SWCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport timeout in milliseconds.
    ///
    /// Set via SWCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects the transport follows.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// URLs pre-fetched into the static partition during install.
    #[serde(default = "default_seed_assets")]
    pub seed_assets: Vec<String>,

    /// Static-partition entry served when a navigation fails and its own URL is not cached.
    #[serde(default = "default_fallback_document")]
    pub fallback_document: String,

    /// Optional prefix for partition names (`{namespace}-{kind}-{version}`).
    #[serde(default)]
    pub partition_namespace: Option<String>,

    /// Freshness window in seconds for content-hashed assets.
    #[serde(default = "default_hashed_max_age")]
    pub hashed_max_age: u64,

    /// Freshness window in seconds for mutable static assets.
    #[serde(default = "default_mutable_max_age")]
    pub mutable_max_age: u64,

    /// Whether install asks to take over immediately instead of waiting.
    ///
    /// Set via SWCACHE_SKIP_WAITING_ON_INSTALL environment variable.
    #[serde(default = "default_true")]
    pub skip_waiting_on_install: bool,
}

fn default_version() -> String {
    "v2.0.0".into()
}

fn default_scope() -> String {
    "http://localhost:8080/".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_seed_assets() -> Vec<String> {
    vec!["./".into(), "./index.html".into(), "./manifest.json".into()]
}

fn default_fallback_document() -> String {
    "./index.html".into()
}

fn default_hashed_max_age() -> u64 {
    31_536_000 // 1 year
}

fn default_mutable_max_age() -> u64 {
    86_400 // 1 day
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            scope: default_scope(),
            store: StoreKind::default(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            seed_assets: default_seed_assets(),
            fallback_document: default_fallback_document(),
            partition_namespace: None,
            hashed_max_age: default_hashed_max_age(),
            mutable_max_age: default_mutable_max_age(),
            skip_waiting_on_install: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the `kind` partition for the configured version.
    pub fn partition_name(&self, kind: PartitionKind) -> String {
        kind.partition_name(self.partition_namespace.as_deref(), &self.version)
    }

    /// Parsed scope URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the scope is not an absolute http(s) URL.
    pub fn scope_url(&self) -> Result<url::Url, ConfigError> {
        let url = url::Url::parse(&self.scope)
            .map_err(|e| ConfigError::Invalid { field: "scope".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid { field: "scope".into(), reason: format!("unsupported scheme: {other}") }),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWCACHE_`
    /// 2. TOML file from `SWCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
