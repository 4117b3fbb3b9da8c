//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PORTAL_BASE_URL` - Public URL for the portal
//! - `PORTAL_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `IDENTITY_API_KEY` - Identity provider API key
//! - `DIRECTORY_API_URL` - Document store base URL (per-user records)
//! - `DIRECTORY_API_KEY` - Document store API key
//! - `CATALOG_API_URL` - Commerce catalog base URL (e.g. https://store.example.com/wp-json/wc/v3)
//! - `CATALOG_CONSUMER_KEY` - Catalog API consumer key
//! - `CATALOG_CONSUMER_SECRET` - Catalog API consumer secret
//! - `PAYMENTS_SECRET_KEY` - Payment processor secret key
//!
//! ## Optional
//! - `PORTAL_HOST` - Bind address (default: 127.0.0.1)
//! - `PORTAL_PORT` - Listen port (default: 3000)
//! - `IDENTITY_API_URL` - Identity provider base URL (default: Google Identity Toolkit v1)
//! - `PAYMENTS_API_URL` - Payment processor base URL (default: https://api.stripe.com)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry tracing sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Price of the premium plan, in minor currency units.
///
/// This is the only amount the portal will ever charge or accept as proof of
/// a premium upgrade. It is deliberately not configurable per request: the
/// client never chooses the amount.
pub const PREMIUM_PLAN_AMOUNT_MINOR: i64 = 4999;

/// Currency of the premium plan price (ISO 4217, lowercase per the processor).
pub const PREMIUM_PLAN_CURRENCY: &str = "gbp";

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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

/// Portal application configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the portal
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Identity provider configuration
    pub identity: IdentityConfig,
    /// Document store configuration
    pub directory: DirectoryConfig,
    /// Commerce catalog configuration
    pub catalog: CatalogConfig,
    /// Payment processor configuration
    pub payments: PaymentsConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry tracing sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Identity provider configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Identity provider REST base URL
    pub api_url: String,
    /// API key appended to every identity call
    pub api_key: SecretString,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Document store configuration.
#[derive(Clone)]
pub struct DirectoryConfig {
    /// Document store REST base URL
    pub api_url: String,
    /// API key sent as a bearer token
    pub api_key: SecretString,
}

impl std::fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Commerce catalog configuration.
///
/// The consumer key/secret pair is only ever used server-side to build the
/// Basic authorization header; it must never reach the client.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Catalog REST base URL
    pub api_url: String,
    /// Consumer key (Basic auth username)
    pub consumer_key: String,
    /// Consumer secret (Basic auth password)
    pub consumer_secret: SecretString,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("api_url", &self.api_url)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .finish()
    }
}

/// Payment processor configuration.
#[derive(Clone)]
pub struct PaymentsConfig {
    /// Payment processor REST base URL
    pub api_url: String,
    /// Secret key sent as a bearer token
    pub secret_key: SecretString,
}

impl std::fmt::Debug for PaymentsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentsConfig")
            .field("api_url", &self.api_url)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl PortalConfig {
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

        let host = get_env_or_default("PORTAL_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORTAL_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("PORTAL_BASE_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_BASE_URL".to_string(), e.to_string()))?;
        let session_secret = get_validated_secret("PORTAL_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "PORTAL_SESSION_SECRET")?;

        let identity = IdentityConfig::from_env()?;
        let directory = DirectoryConfig::from_env()?;
        let catalog = CatalogConfig::from_env()?;
        let payments = PaymentsConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = parse_rate("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = parse_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?;

        Ok(Self {
            host,
            port,
            base_url,
            session_secret,
            identity,
            directory,
            catalog,
            payments,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// The absolute URL the payment processor redirects back to after a
    /// hosted confirmation.
    #[must_use]
    pub fn payment_return_url(&self) -> String {
        format!("{}/payment/complete", self.base_url.trim_end_matches('/'))
    }
}

impl IdentityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: get_env_or_default(
                "IDENTITY_API_URL",
                "https://identitytoolkit.googleapis.com/v1",
            ),
            api_key: get_required_secret("IDENTITY_API_KEY")?,
        })
    }
}

impl DirectoryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: get_required_env("DIRECTORY_API_URL")?,
            api_key: get_validated_secret("DIRECTORY_API_KEY")?,
        })
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: get_required_env("CATALOG_API_URL")?,
            consumer_key: get_required_env("CATALOG_CONSUMER_KEY")?,
            consumer_secret: get_validated_secret("CATALOG_CONSUMER_SECRET")?,
        })
    }
}

impl PaymentsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: get_env_or_default("PAYMENTS_API_URL", "https://api.stripe.com"),
            secret_key: get_validated_secret("PAYMENTS_SECRET_KEY")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional sample-rate variable.
fn parse_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<f32>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> PortalConfig {
        PortalConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(64)),
            identity: IdentityConfig {
                api_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
                api_key: SecretString::from("AIzaSyB4kT9qLw"),
            },
            directory: DirectoryConfig {
                api_url: "https://records.test".to_string(),
                api_key: SecretString::from("dk_9fQ2xW"),
            },
            catalog: CatalogConfig {
                api_url: "https://store.test/wp-json/wc/v3".to_string(),
                consumer_key: "ck_12345".to_string(),
                consumer_secret: SecretString::from("cs_67890"),
            },
            payments: PaymentsConfig {
                api_url: "https://api.stripe.com".to_string(),
                secret_key: SecretString::from("sk_test_4eC39H"),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_payment_return_url_strips_trailing_slash() {
        let mut config = test_config();
        config.base_url = "https://portal.test/".to_string();
        assert_eq!(
            config.payment_return_url(),
            "https://portal.test/payment/complete"
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = test_config();
        let debug_output = format!("{config:?}");

        // Public fields should be visible
        assert!(debug_output.contains("ck_12345"));
        assert!(debug_output.contains("store.test"));

        // Secret fields should be redacted
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("cs_67890"));
        assert!(!debug_output.contains("sk_test_4eC39H"));
    }

    #[test]
    fn test_premium_plan_constants() {
        // The handshake's expected amount; changing this changes what every
        // verification accepts.
        assert_eq!(PREMIUM_PLAN_AMOUNT_MINOR, 4999);
        assert_eq!(PREMIUM_PLAN_CURRENCY, "gbp");
    }
}
