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
    /// Returns `ConfigError::Missing` if `cache_name` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - a precache entry or exclusion value is empty
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_name".into(),
                hint: "Set SHELLCACHE_CACHE_NAME to the deployed version tag".into(),
            });
        }

        self.origin_url()?;

        if let Some(pos) = self.precache.iter().position(|entry| entry.trim().is_empty()) {
            return Err(ConfigError::Invalid { field: "precache".into(), reason: format!("entry {pos} is empty") });
        }

        if let Some(rule) = self.exclusions.iter().find(|rule| rule.value().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "exclusions".into(),
                reason: format!("{rule} would match every request"),
            });
        }

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

        if self.precache.is_empty() {
            tracing::warn!(cache_name = %self.cache_name, "precache manifest is empty; nothing is available offline until first use");
        }

        Ok(())
    }
}
