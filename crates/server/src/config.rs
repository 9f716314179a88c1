//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPLIST_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SHOPLIST_TOKEN_SECRET` - Bearer token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `SHOPLIST_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPLIST_PORT` - Listen port (default: 5000)
//! - `SHOPLIST_TOKEN_TTL_MINUTES` - Bearer token lifetime (default: 90)
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM` -
//!   Outbound mail; set all of them (port defaults to 587) or none
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use chrono::TimeDelta;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_TOKEN_TTL_MINUTES: &str = "90";
const DEFAULT_SMTP_PORT: u16 = 587;

const SMTP_VARS: &[&str] = &[
    "SMTP_HOST",
    "SMTP_PORT",
    "SMTP_USERNAME",
    "SMTP_PASSWORD",
    "SMTP_FROM",
];

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

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer token signing secret
    pub token_secret: SecretString,
    /// Bearer token lifetime
    pub token_ttl: TimeDelta,
    /// Outbound mail; `None` disables reset mail
    pub smtp: Option<SmtpConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// SMTP relay configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct SmtpConfig {
    /// Relay host
    pub host: String,
    /// Relay port (STARTTLS)
    pub port: u16,
    /// Relay username
    pub username: String,
    /// Relay password
    pub password: SecretString,
    /// Address mail is sent from
    pub from_address: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl ServerConfig {
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

        let database_url = get_database_url("SHOPLIST_DATABASE_URL")?;
        let host = get_env_or_default("SHOPLIST_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPLIST_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("SHOPLIST_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPLIST_PORT".to_owned(), e.to_string()))?;

        let token_secret = get_validated_secret("SHOPLIST_TOKEN_SECRET")?;
        validate_secret_length(&token_secret, "SHOPLIST_TOKEN_SECRET")?;
        let token_ttl = parse_ttl_minutes(&get_env_or_default(
            "SHOPLIST_TOKEN_TTL_MINUTES",
            DEFAULT_TOKEN_TTL_MINUTES,
        ))?;

        let smtp = SmtpConfig::from_lookup(get_optional_env)?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            token_secret,
            token_ttl,
            smtp,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SmtpConfig {
    /// Build from a variable lookup. Returns `None` when no `SMTP_*` variable
    /// is set.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        if SMTP_VARS.iter().all(|&key| get(key).is_none()) {
            return Ok(None);
        }

        let required = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_owned()));
        let port = match get("SMTP_PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_owned(), e.to_string()))?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Some(Self {
            host: required("SMTP_HOST")?,
            port,
            username: required("SMTP_USERNAME")?,
            password: SecretString::from(required("SMTP_PASSWORD")?),
            from_address: required("SMTP_FROM")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_ttl_minutes(value: &str) -> Result<TimeDelta, ConfigError> {
    let invalid = |reason: String| {
        ConfigError::InvalidEnvVar("SHOPLIST_TOKEN_TTL_MINUTES".to_owned(), reason)
    };
    let minutes = value.parse::<u32>().map_err(|e| invalid(e.to_string()))?;
    if minutes == 0 {
        return Err(invalid("must be at least 1".to_owned()));
    }
    Ok(TimeDelta::minutes(i64::from(minutes)))
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
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
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
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
                var_name.to_owned(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
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
