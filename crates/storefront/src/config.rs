//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SAVVY_API_BASE_URL` - Backend origin (default: `http://localhost:9090`)
//! - `SAVVY_AUTH_TOKEN` - Session token sent as the `authToken` cookie
//! - `SAVVY_DEFAULT_CATEGORY` - Category shown first (default: `Shirts`)
//! - `SAVVY_PLACEHOLDER_IMAGE_URL` - Image for products without one
//! - `SAVVY_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: none)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use savvy_core::PLACEHOLDER_IMAGE_URL;

const DEFAULT_API_BASE_URL: &str = "http://localhost:9090";
const DEFAULT_CATEGORY: &str = "Shirts";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Category loaded when none is selected
    pub default_category: String,
    /// Image shown for products without one
    pub placeholder_image_url: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., production, staging)
    pub sentry_environment: Option<String>,
}

/// Backend API configuration.
///
/// Implements `Debug` manually to redact the credential.
#[derive(Clone)]
pub struct ApiConfig {
    /// Backend origin; always ends with `/` so endpoint paths join below it
    pub base_url: Url,
    /// Session token carried with every request
    pub auth_token: Option<SecretString>,
    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig::from_env()?;
        let default_category = get_env_or_default("SAVVY_DEFAULT_CATEGORY", DEFAULT_CATEGORY);
        if default_category.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "SAVVY_DEFAULT_CATEGORY".to_string(),
                "must not be blank".to_string(),
            ));
        }

        Ok(Self {
            api,
            default_category,
            placeholder_image_url: get_env_or_default(
                "SAVVY_PLACEHOLDER_IMAGE_URL",
                PLACEHOLDER_IMAGE_URL,
            ),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url(
            "SAVVY_API_BASE_URL",
            &get_env_or_default("SAVVY_API_BASE_URL", DEFAULT_API_BASE_URL),
        )?;
        let request_timeout = get_optional_env("SAVVY_REQUEST_TIMEOUT_SECS")
            .map(|value| parse_timeout("SAVVY_REQUEST_TIMEOUT_SECS", &value))
            .transpose()?;

        Ok(Self {
            base_url,
            auth_token: get_optional_env("SAVVY_AUTH_TOKEN").map(SecretString::from),
            request_timeout,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse the backend origin, requiring http(s) and a trailing slash.
fn parse_base_url(var_name: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Parse a positive number of seconds.
fn parse_timeout(var_name: &str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be greater than zero".to_string(),
        )),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string())),
    }
}
