//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SPROUT_BASE_URL` - Public URL for the storefront
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_STOREFRONT_PRIVATE_TOKEN` - Storefront API private access token
//!
//! ## Optional
//! - `SPROUT_HOST` - Bind address (default: 127.0.0.1)
//! - `SPROUT_PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - API version (default: 2026-01)
//! - `SHOPIFY_STOREFRONT_ENDPOINT` - GraphQL endpoint override (e.g. a local proxy)
//! - `WIDGET_SCRIPT_URL` - Subscription widget script (https)
//! - `WIDGET_STYLE_CONFIG` - Widget style JSON object
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_WIDGET_SCRIPT_URL: &str =
    "https://cnstatic.devcb.in/static/app-static-assets/cb-ecom-vue/widget/js/index.js";

const DEFAULT_WIDGET_STYLE_CONFIG: &str = r##"{"primaryTextColor":"#725327","bgColor":"#FFFFFF","secondaryTextColor":"#64648C","highlightColor":"#7f4210"}"##;

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
    "put-your",
    "add-your",
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
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Shopify Storefront API configuration
    pub shopify: ShopifyStorefrontConfig,
    /// Subscription widget configuration
    pub widget: WidgetConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// Shopify Storefront API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2026-01)
    pub api_version: String,
    /// Storefront API private access token (server-side only)
    pub storefront_private_token: SecretString,
    /// Full GraphQL endpoint URL, replacing the one derived from `store`
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("storefront_private_token", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Third-party subscription widget configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    /// Script URL loaded into `<head>` on pages with selling plans
    pub script_url: String,
    /// Style JSON handed to the widget via `data-cb_config`
    pub style_config: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            script_url: DEFAULT_WIDGET_SCRIPT_URL.to_string(),
            style_config: DEFAULT_WIDGET_STYLE_CONFIG.to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("SPROUT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SPROUT_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SPROUT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SPROUT_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("SPROUT_BASE_URL")?;

        let shopify = ShopifyStorefrontConfig::from_env()?;
        let widget = WidgetConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            shopify,
            widget,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyStorefrontConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store: get_required_env("SHOPIFY_STORE")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2026-01"),
            storefront_private_token: get_validated_secret("SHOPIFY_STOREFRONT_PRIVATE_TOKEN")?,
            endpoint: get_optional_env("SHOPIFY_STOREFRONT_ENDPOINT"),
        })
    }

    /// Storefront API GraphQL endpoint.
    #[must_use]
    pub fn graphql_endpoint(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            format!("https://{}/api/{}/graphql.json", self.store, self.api_version)
        })
    }
}

impl WidgetConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            script_url: get_env_or_default("WIDGET_SCRIPT_URL", DEFAULT_WIDGET_SCRIPT_URL),
            style_config: get_env_or_default("WIDGET_STYLE_CONFIG", DEFAULT_WIDGET_STYLE_CONFIG),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the script is served over https and the style config is a
    /// JSON object.
    fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.script_url).map_err(|e| {
            ConfigError::InvalidEnvVar("WIDGET_SCRIPT_URL".to_string(), e.to_string())
        })?;
        if url.scheme() != "https" {
            return Err(ConfigError::InvalidEnvVar(
                "WIDGET_SCRIPT_URL".to_string(),
                "must use https".to_string(),
            ));
        }

        match serde_json::from_str::<serde_json::Value>(&self.style_config) {
            Ok(serde_json::Value::Object(_)) => Ok(()),
            Ok(_) => Err(ConfigError::InvalidEnvVar(
                "WIDGET_STYLE_CONFIG".to_string(),
                "must be a JSON object".to_string(),
            )),
            Err(e) => Err(ConfigError::InvalidEnvVar(
                "WIDGET_STYLE_CONFIG".to_string(),
                e.to_string(),
            )),
        }
    }

    /// Origin of the script URL (`https://host[:port]`), for the CSP.
    #[must_use]
    pub fn script_origin(&self) -> Option<String> {
        url::Url::parse(&self.script_url)
            .ok()
            .map(|url| url.origin().ascii_serialization())
            .filter(|origin| origin != "null")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real access tokens are random hex or base64
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

/// Configuration for unit and route tests; never touches the environment.
#[cfg(test)]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        shopify: ShopifyStorefrontConfig {
            store: "sprout-test.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            storefront_private_token: SecretString::from("shpat_9f8e7d6c5b4a"),
            endpoint: None,
        },
        widget: WidgetConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}
