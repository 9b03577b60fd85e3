//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `ESEWA_FORM_URL` - eSewa hosted payment form (default: sandbox)
//! - `ESEWA_STATUS_URL` - eSewa transaction status endpoint (default: sandbox)
//! - `ESEWA_PRODUCT_CODE` - eSewa merchant code (default: EPAYTEST)
//! - `PAYMENT_GATEWAY_TIMEOUT_SECS` - Gateway HTTP timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Payment gateway configuration
    pub payments: PaymentConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Payment gateway configuration.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// eSewa hosted payment form URL
    pub esewa_form_url: String,
    /// eSewa transaction status lookup URL
    pub esewa_status_url: String,
    /// eSewa merchant product code
    pub esewa_product_code: String,
    /// HTTP timeout for gateway calls, in seconds
    pub gateway_timeout_secs: u64,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing, a value
    /// cannot be parsed, or the session secret looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = require_env("STOREFRONT_DATABASE_URL")?;
        let base_url = require_env("STOREFRONT_BASE_URL")?;
        let session_secret = require_env("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret("STOREFRONT_SESSION_SECRET", &session_secret)?;

        let host = optional_env("STOREFRONT_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_owned())
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_owned(), e.to_string()))?;

        let port = optional_env("STOREFRONT_PORT")
            .unwrap_or_else(|| "3000".to_owned())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_owned(), e.to_string()))?;

        let gateway_timeout_secs = optional_env("PAYMENT_GATEWAY_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_owned())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PAYMENT_GATEWAY_TIMEOUT_SECS".to_owned(), e.to_string())
            })?;

        Ok(Self {
            database_url: database_url.into(),
            host,
            port,
            base_url,
            session_secret: session_secret.into(),
            payments: PaymentConfig {
                esewa_form_url: optional_env("ESEWA_FORM_URL").unwrap_or_else(|| {
                    "https://rc-epay.esewa.com.np/api/epay/main/v2/form".to_owned()
                }),
                esewa_status_url: optional_env("ESEWA_STATUS_URL").unwrap_or_else(|| {
                    "https://rc-epay.esewa.com.np/api/epay/transaction/status".to_owned()
                }),
                esewa_product_code: optional_env("ESEWA_PRODUCT_CODE")
                    .unwrap_or_else(|| "EPAYTEST".to_owned()),
                gateway_timeout_secs,
            },
            sentry_dsn: optional_env("SENTRY_DSN"),
            sentry_environment: optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// The socket address to bind the server to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public base URL is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Reject session secrets that are too short or look like placeholders.
fn validate_session_secret(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            format!("must be at least {MIN_SESSION_SECRET_LENGTH} characters"),
        ));
    }

    let lowered = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS
        .iter()
        .find(|pattern| lowered.contains(*pattern))
    {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            format!("contains placeholder pattern '{pattern}'"),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_session_secrets_are_rejected() {
        let err = validate_session_secret("TEST", "too-short").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(..)));
    }

    #[test]
    fn placeholder_session_secrets_are_rejected() {
        let err =
            validate_session_secret("TEST", "changeme-changeme-changeme-changeme").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(..)));
    }

    #[test]
    fn high_entropy_session_secrets_pass() {
        assert!(
            validate_session_secret("TEST", "kJ8vQ2mNpR5tY7wZ1aB4cD6eF9gH3iL0").is_ok()
        );
    }
}
