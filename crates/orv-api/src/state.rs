//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! The loaded data package is read-only after startup, so the state holds it
//! behind an `Arc` and clones cheaply per request. Package validation loads
//! its own package per request and never touches the shared one.

use std::sync::Arc;
use std::time::Duration;

use orv_core::ValidatorError;
use orv_package::{DataPackage, ResourceLocator};
use orv_validator::Validator;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 1330;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Descriptor to serve instead of the bundled Open Referral package.
    pub datapackage: Option<String>,
    /// Timeout for remote fetches and existence probes.
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            datapackage: None,
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `HOST` (default: `0.0.0.0`)
    /// - `PORT` (default: `1330`)
    /// - `ORV_DATAPACKAGE` (default: the bundled Open Referral package)
    /// - `ORV_HTTP_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT".to_string(), raw))?,
            None => DEFAULT_PORT,
        };
        let http_timeout_secs = match lookup("ORV_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse() {
                Ok(secs) if secs > 0 => secs,
                _ => return Err(ConfigError::Invalid("ORV_HTTP_TIMEOUT_SECS".to_string(), raw)),
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            host: lookup("HOST")
                .filter(|h| !h.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            datapackage: lookup("ORV_DATAPACKAGE").filter(|p| !p.trim().is_empty()),
            http_timeout_secs,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Configuration and startup errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: '{1}'")]
    Invalid(String, String),
    #[error("cannot build HTTP client: {0}")]
    Http(String),
    #[error(transparent)]
    Package(#[from] ValidatorError),
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub validator: Validator,
    pub http: reqwest::Client,
}

impl AppState {
    /// State over an already loaded package.
    pub fn with_package(config: AppConfig, package: DataPackage) -> Result<Self, ConfigError> {
        let timeout = config.http_timeout();
        let http = orv_table::http_client(timeout).map_err(|e| ConfigError::Http(e.to_string()))?;
        let locator =
            ResourceLocator::with_timeout(timeout).map_err(|e| ConfigError::Http(e.to_string()))?;
        Ok(Self {
            validator: Validator::new(Some(Arc::new(package)), locator, http.clone()),
            config,
            http,
        })
    }

    /// Load the configured package, or the bundled one when none is set.
    pub async fn load(config: AppConfig) -> Result<Self, ConfigError> {
        let package = match &config.datapackage {
            Some(location) => {
                let http = orv_table::http_client(config.http_timeout())
                    .map_err(|e| ConfigError::Http(e.to_string()))?;
                DataPackage::load(location, &http).await?
            }
            None => DataPackage::open_referral()?,
        };
        Self::with_package(config, package)
    }

    /// State over the bundled Open Referral package with default settings.
    pub fn open_referral() -> Result<Self, ConfigError> {
        Self::with_package(AppConfig::default(), DataPackage::open_referral()?)
    }
}
