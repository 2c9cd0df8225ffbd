//! Process configuration, read once at startup from the environment.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use corpreg_auth::{ApiCredentials, JwtSettings};
use corpreg_observability::LogFormat;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_JWT_ISSUER: &str = "corpreg";
pub const DEFAULT_JWT_AUDIENCE: &str = "corpreg-api";
pub const DEFAULT_JWT_TTL_MINUTES: i64 = 60;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";
const DEV_USERNAME: &str = "testuser";
const DEV_PASSWORD: &str = "password123";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Immutable application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` selects the in-memory repository.
    pub database_url: Option<String>,
    pub jwt: JwtSettings,
    pub credentials: ApiCredentials,
    pub log_format: LogFormat,
    dev_defaults: Vec<&'static str>,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut dev_defaults = Vec::new();

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", &bind_raw, e))?;

        let ttl = match get("JWT_TTL_MINUTES") {
            None => DEFAULT_JWT_TTL_MINUTES,
            Some(raw) => match raw.parse::<i64>() {
                Ok(minutes) if minutes > 0 => minutes,
                Ok(_) => {
                    return Err(ConfigError::invalid(
                        "JWT_TTL_MINUTES",
                        &raw,
                        "must be positive",
                    ));
                }
                Err(e) => return Err(ConfigError::invalid("JWT_TTL_MINUTES", &raw, e)),
            },
        };

        let log_format = match get("LOG_FORMAT") {
            None => LogFormat::default(),
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::invalid("LOG_FORMAT", &raw, e))?,
        };

        let mut or_dev = |key: &'static str, fallback: &str| {
            get(key).unwrap_or_else(|| {
                dev_defaults.push(key);
                fallback.to_string()
            })
        };
        let secret = or_dev("JWT_SECRET", DEV_JWT_SECRET);
        let username = or_dev("API_USERNAME", DEV_USERNAME);
        let password = or_dev("API_PASSWORD", DEV_PASSWORD);

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            jwt: JwtSettings {
                secret,
                issuer: get("JWT_ISSUER").unwrap_or_else(|| DEFAULT_JWT_ISSUER.to_string()),
                audience: get("JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_JWT_AUDIENCE.to_string()),
                ttl: Duration::minutes(ttl),
            },
            credentials: ApiCredentials::new(username, password),
            log_format,
            dev_defaults,
        })
    }

    /// Keys that fell back to insecure development values.
    pub fn dev_defaults(&self) -> &[&'static str] {
        &self.dev_defaults
    }

    /// Log one warning per insecure default. Call after logging is initialised.
    pub fn warn_dev_defaults(&self) {
        for key in &self.dev_defaults {
            tracing::warn!("{key} not set; using insecure dev default");
        }
    }
}
