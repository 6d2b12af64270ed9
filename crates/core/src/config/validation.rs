//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `version` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `scope` is not an absolute http(s) URL
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - either max-age is 0
    /// - `fallback_document` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "version".into(),
                hint: "Set SWCACHE_VERSION to the build identifier".into(),
            });
        }

        self.scope_url()?;

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.hashed_max_age == 0 {
            return Err(ConfigError::Invalid { field: "hashed_max_age".into(), reason: "must be greater than 0".into() });
        }
        if self.mutable_max_age == 0 {
            return Err(ConfigError::Invalid { field: "mutable_max_age".into(), reason: "must be greater than 0".into() });
        }

        if self.fallback_document.is_empty() {
            return Err(ConfigError::Invalid { field: "fallback_document".into(), reason: "must not be empty".into() });
        }

        if self.hashed_max_age < self.mutable_max_age {
            tracing::warn!(
                hashed_max_age = self.hashed_max_age,
                mutable_max_age = self.mutable_max_age,
                "content-hashed assets expire sooner than mutable ones"
            );
        }

        Ok(())
    }
}
