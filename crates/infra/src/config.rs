//! Configuration loading and representation.
//!
//! Both services are configured through environment variables, read once at
//! startup. `from_lookup` takes the variable source as a closure so tests do
//! not have to mutate the process environment.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_LISTINGS_BIND_ADDR: &str = "0.0.0.0:8001";
pub const DEFAULT_AUTH_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_AUTH_SERVICE_URL: &str = "http://auth-service:8000";
pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1_000;

/// Used only when `JWT_SECRET` is unset; the auth service logs a warning.
pub const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

/// Where the listings service keeps its documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres { database_url: String },
}

/// Listings service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingsConfig {
    pub bind_addr: SocketAddr,
    /// Base address of the authentication authority.
    pub auth_service_url: String,
    /// Upper bound on one verification call.
    pub verify_timeout: Duration,
    pub connect_timeout: Duration,
    pub store: StoreBackend,
    /// JSON array of listings loaded at startup.
    pub seed_path: Option<PathBuf>,
    /// Browser origins allowed by CORS; empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl ListingsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = parse_addr(
            "LISTINGS_BIND_ADDR",
            lookup("LISTINGS_BIND_ADDR").as_deref().unwrap_or(DEFAULT_LISTINGS_BIND_ADDR),
        )?;

        let auth_service_url = lookup("AUTH_SERVICE_URL")
            .unwrap_or_else(|| DEFAULT_AUTH_SERVICE_URL.to_string());
        if !(auth_service_url.starts_with("http://") || auth_service_url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "AUTH_SERVICE_URL",
                "must start with http:// or https://",
            ));
        }

        let verify_timeout = parse_millis(
            "AUTH_VERIFY_TIMEOUT_MS",
            lookup("AUTH_VERIFY_TIMEOUT_MS"),
            DEFAULT_VERIFY_TIMEOUT_MS,
        )?;
        let connect_timeout = parse_millis(
            "AUTH_CONNECT_TIMEOUT_MS",
            lookup("AUTH_CONNECT_TIMEOUT_MS"),
            DEFAULT_CONNECT_TIMEOUT_MS,
        )?;

        let store = match lookup("DATABASE_URL").filter(|s| !s.trim().is_empty()) {
            Some(database_url) => StoreBackend::Postgres { database_url },
            None => StoreBackend::InMemory,
        };

        Ok(Self {
            bind_addr,
            auth_service_url,
            verify_timeout,
            connect_timeout,
            store,
            seed_path: lookup("LISTINGS_SEED_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            cors_allowed_origins: parse_origins(lookup("CORS_ALLOWED_ORIGINS").as_deref()),
        })
    }
}

/// Authentication service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthServiceConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// False when the secret fell back to [`DEV_JWT_SECRET`].
    pub jwt_secret_from_env: bool,
}

impl AuthServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = parse_addr(
            "AUTH_BIND_ADDR",
            lookup("AUTH_BIND_ADDR").as_deref().unwrap_or(DEFAULT_AUTH_BIND_ADDR),
        )?;

        let (jwt_secret, jwt_secret_from_env) = match lookup("JWT_SECRET") {
            Some(s) if !s.is_empty() => (s, true),
            Some(_) => return Err(ConfigError::invalid("JWT_SECRET", "must not be empty")),
            None => (DEV_JWT_SECRET.to_string(), false),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            jwt_secret_from_env,
        })
    }
}

fn parse_addr(name: &'static str, raw: &str) -> Result<SocketAddr, ConfigError> {
    raw.parse()
        .map_err(|e: std::net::AddrParseError| ConfigError::invalid(name, e.to_string()))
}

/// Comma-separated origin list; `*` or nothing means any origin.
fn parse_origins(raw: Option<&str>) -> Vec<String> {
    match raw.map(str::trim) {
        None | Some("") | Some("*") => Vec::new(),
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

fn parse_millis(name: &'static str, raw: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let ms = match raw {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::invalid(name, e.to_string()))?,
        None => default,
    };
    if ms == 0 {
        return Err(ConfigError::invalid(name, "must be greater than zero"));
    }
    Ok(Duration::from_millis(ms))
}
