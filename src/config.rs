//! Configuration types for document validation.
//!
//! All client behaviour is controlled through [`ValidatorConfig`], built via
//! its [`ValidatorConfigBuilder`]. The config is plain data: cloning it per
//! submission is cheap and no state leaks from one attempt to the next.

use crate::error::ClassifiedError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base URL used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:9002";

/// Environment variable holding the base URL override.
pub const BASE_URL_ENV: &str = "VALIDATOR_API_URL";

/// Path of the validation endpoint, appended to the base URL.
pub const VALIDATE_PATH: &str = "/document/v2/validate";

/// Default upload ceiling: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration for a validation client.
///
/// Built via [`ValidatorConfig::builder()`], [`ValidatorConfig::from_env()`]
/// or [`ValidatorConfig::default()`].
///
/// # Example
/// ```rust
/// use docval::ValidatorConfig;
///
/// let config = ValidatorConfig::builder()
///     .base_url("https://validator.internal:9002/")
///     .timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url, "https://validator.internal:9002");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Service base URL, without a trailing slash. Default: `http://localhost:9002`.
    pub base_url: String,

    /// Largest accepted upload in bytes. Default: 10 MiB.
    ///
    /// Checked locally before any request is built; the service enforces its
    /// own limit independently (surfacing as HTTP 413).
    pub max_file_size: u64,

    /// Whole-request timeout in seconds, covering upload, processing and the
    /// response body. Default: 120.
    ///
    /// The service runs OCR and detection synchronously, so multi-page scans
    /// routinely take tens of seconds.
    pub timeout_secs: u64,

    /// Synthetic progress increment per tick, in percent. Default: 10.
    pub progress_step: u8,

    /// Interval between synthetic progress ticks in milliseconds. Default: 200.
    pub progress_interval_ms: u64,

    /// Ceiling for the synthetic ramp, in percent (exclusive of 100). Default: 90.
    pub progress_cap: u8,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            timeout_secs: 120,
            progress_step: 10,
            progress_interval_ms: 200,
            progress_cap: 90,
        }
    }
}

impl ValidatorConfig {
    /// Create a new builder for `ValidatorConfig`.
    pub fn builder() -> ValidatorConfigBuilder {
        ValidatorConfigBuilder {
            config: Self::default(),
        }
    }

    /// Builder pre-seeded with the base URL from [`BASE_URL_ENV`], if set.
    pub fn builder_from_env() -> ValidatorConfigBuilder {
        let builder = Self::builder();
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => builder.base_url(url),
            _ => builder,
        }
    }

    /// Default configuration with the environment base-URL override applied.
    pub fn from_env() -> Result<Self, ClassifiedError> {
        Self::builder_from_env().build()
    }

    /// Full URL of the validation endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, VALIDATE_PATH)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

/// Builder for [`ValidatorConfig`].
#[derive(Debug)]
pub struct ValidatorConfigBuilder {
    config: ValidatorConfig,
}

impl ValidatorConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    /// Convenience for [`Self::max_file_size`] in MiB.
    pub fn max_file_size_mib(mut self, mib: u64) -> Self {
        self.config.max_file_size = mib.saturating_mul(1024 * 1024);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn progress_step(mut self, step: u8) -> Self {
        self.config.progress_step = step;
        self
    }

    pub fn progress_interval_ms(mut self, ms: u64) -> Self {
        self.config.progress_interval_ms = ms;
        self
    }

    pub fn progress_cap(mut self, cap: u8) -> Self {
        self.config.progress_cap = cap;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ValidatorConfig, ClassifiedError> {
        let c = &self.config;
        let invalid = |reason: String| ClassifiedError::InvalidInput { reason };

        if c.base_url.is_empty() {
            return Err(invalid("Base URL must not be empty".into()));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(invalid(format!(
                "Base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.max_file_size == 0 {
            return Err(invalid("Maximum file size must be ≥ 1 byte".into()));
        }
        if c.timeout_secs == 0 {
            return Err(invalid("Timeout must be ≥ 1s".into()));
        }
        if c.progress_step == 0 || c.progress_interval_ms == 0 {
            return Err(invalid(
                "Progress step and interval must both be ≥ 1".into(),
            ));
        }
        if c.progress_cap == 0 || c.progress_cap >= 100 {
            return Err(invalid(format!(
                "Progress cap must be 1–99, got {}",
                c.progress_cap
            )));
        }
        Ok(self.config)
    }
}
