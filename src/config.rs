//! Environment configuration
//!
//! All tuning comes from environment variables, with a `.env` file loaded
//! for local development. Missing credentials or a missing database URL are
//! fatal startup errors; everything else has a default.

use std::env;
use std::time::Duration;

use crate::hub::KeepaliveConfig;

/// Errors raised while loading configuration. All of them abort startup.
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable is not set
    MissingVar(&'static str),
    /// A variable is set but cannot be parsed
    InvalidVar(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVar(key) => {
                write!(f, "{} environment variable is required", key)
            }
            ConfigError::InvalidVar(key, value) => {
                write!(f, "invalid value for {}: {}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub frontend_url: String,
    pub admin_username: String,
    pub admin_password: String,
    pub shutdown_timeout: Duration,
    pub keepalive: KeepaliveConfig,
}

impl Config {
    /// Load from the environment. `ADMIN_PASSWORD` is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_raw = env_or_default("PORT", "8080");
        let port = port_raw
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidVar("PORT", port_raw.clone()))?;

        let admin_password =
            env::var("ADMIN_PASSWORD").map_err(|_| ConfigError::MissingVar("ADMIN_PASSWORD"))?;
        if admin_password.is_empty() {
            return Err(ConfigError::MissingVar("ADMIN_PASSWORD"));
        }

        Ok(Self {
            port,
            frontend_url: env_or_default("FRONTEND_URL", "http://localhost:5173"),
            admin_username: env_or_default("ADMIN_USERNAME", "admin"),
            admin_password,
            shutdown_timeout: Duration::from_secs(env_u64_or_default("SHUTDOWN_TIMEOUT", 30)),
            keepalive: KeepaliveConfig {
                ping_interval: Duration::from_secs(env_u64_or_default("PING_INTERVAL", 30)),
                write_deadline: Duration::from_secs(env_u64_or_default("WRITE_DEADLINE", 10)),
                read_window: Duration::from_secs(env_u64_or_default(
                    "READ_WINDOW",
                    24 * 60 * 60,
                )),
            },
        })
    }
}

/// Database pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_conns: u32,
    pub min_conns: u32,
    pub max_conn_lifetime: Duration,
    pub max_conn_idle_time: Duration,
}

impl DbConfig {
    /// Load from the environment. `DATABASE_URL` is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?;
        if url.is_empty() {
            return Err(ConfigError::MissingVar("DATABASE_URL"));
        }

        Ok(Self {
            url,
            max_conns: env_u64_or_default("DB_MAX_CONNS", 25) as u32,
            min_conns: env_u64_or_default("DB_MIN_CONNS", 5) as u32,
            max_conn_lifetime: Duration::from_secs(env_u64_or_default(
                "DB_MAX_CONN_LIFETIME",
                3600,
            )),
            max_conn_idle_time: Duration::from_secs(env_u64_or_default(
                "DB_MAX_CONN_IDLE_TIME",
                1800,
            )),
        })
    }
}

fn env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

// An unparsable value falls back to the default rather than failing startup.
fn env_u64_or_default(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.parse().unwrap_or(default),
        Err(_) => default,
    }
}
