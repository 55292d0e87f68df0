//! Sync engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `WISHLIST_API_URL` - Base URL of the wishlist service
//! - `PRODUCT_API_URL` - Base URL of the product catalog service
//! - `PRICE_API_URL` - Base URL of the price service
//! - `ACCOUNT_API_URL` - Base URL of the customer account service
//! - `WISHLIST_SITE_CODE` - Site code sent as the `hybris-site` header
//! - `WISHLIST_ACCESS_TOKEN` - Bearer token of the authenticated session
//!
//! ## Optional
//! - `WISHLIST_CURRENCY_ID` - Active currency (default: USD)
//! - `WISHLIST_CURRENCY_SYMBOL` - Symbol attached to enriched wishlists (default: $)
//! - `WISHLIST_PAGE_SIZE` - Products per catalog request, 1-100 (default: 16)
//! - `WISHLIST_GATEWAY_TIMEOUT_SECS` - Per-call timeout in seconds (default: 30)

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::enrich::DEFAULT_PAGE_SIZE;

const MAX_PAGE_SIZE: usize = 100;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &["your-", "changeme", "replace", "placeholder", "xxx"];

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

/// The active currency of the storefront session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyContext {
    /// Currency id passed to the price service (e.g. "USD").
    pub id: String,
    /// Display symbol attached to the wishlist (e.g. "$").
    pub symbol: String,
}

impl CurrencyContext {
    /// Create a currency context.
    #[must_use]
    pub fn new(id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
        }
    }
}

impl Default for CurrencyContext {
    fn default() -> Self {
        Self::new("USD", "$")
    }
}

/// Endpoints and credentials of the remote services.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct EndpointConfig {
    /// Wishlist service base URL
    pub wishlist_url: Url,
    /// Product catalog base URL
    pub product_url: Url,
    /// Price service base URL
    pub price_url: Url,
    /// Account service base URL
    pub account_url: Url,
    /// Site code header value
    pub site_code: String,
    /// Session bearer token
    pub access_token: SecretString,
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("wishlist_url", &self.wishlist_url.as_str())
            .field("product_url", &self.product_url.as_str())
            .field("price_url", &self.price_url.as_str())
            .field("account_url", &self.account_url.as_str())
            .field("site_code", &self.site_code)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Full engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Remote service endpoints
    pub endpoints: EndpointConfig,
    /// Active currency
    pub currency: CurrencyContext,
    /// Products per catalog request
    pub page_size: usize,
    /// Timeout applied to every gateway call
    pub gateway_timeout: Duration,
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the access token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`SyncConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let endpoints = EndpointConfig {
            wishlist_url: env.url("WISHLIST_API_URL")?,
            product_url: env.url("PRODUCT_API_URL")?,
            price_url: env.url("PRICE_API_URL")?,
            account_url: env.url("ACCOUNT_API_URL")?,
            site_code: env.required("WISHLIST_SITE_CODE")?,
            access_token: env.secret("WISHLIST_ACCESS_TOKEN")?,
        };

        let currency = CurrencyContext::new(
            env.or_default("WISHLIST_CURRENCY_ID", "USD"),
            env.or_default("WISHLIST_CURRENCY_SYMBOL", "$"),
        );

        let page_size = env.parsed("WISHLIST_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ConfigError::InvalidEnvVar(
                "WISHLIST_PAGE_SIZE".to_string(),
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }

        let timeout_secs = env.parsed("WISHLIST_GATEWAY_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "WISHLIST_GATEWAY_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            endpoints,
            currency,
            page_size,
            gateway_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        (self.0)(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn url(&self, key: &str) -> Result<Url, ConfigError> {
        let raw = self.required(key)?;
        Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        (self.0)(key).map_or(Ok(default), |raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    fn secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let secret = SecretString::from(self.required(key)?);
        validate_secret(secret.expose_secret(), key)?;
        Ok(secret)
    }
}

/// Reject tokens that are obviously copied from a sample `.env`.
fn validate_secret(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lowered = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lowered.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("contains placeholder pattern '{pattern}'"),
        ));
    }
    Ok(())
}
