//! Runtime configuration, read from environment variables.
//!
//! `main` loads an optional `.env` file first, so every variable below can
//! also live there.

use axum::http::HeaderValue;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::{fmt as subscriber_fmt, EnvFilter};

use crate::storage::json::JsonConnection;
use crate::storage::kv::DEFAULT_PREDICTIONS_KEY;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SQLITE_URL: &str = "sqlite:predictions_kv.db";
pub const DEFAULT_PING_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8080";

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Which key-value service holds the primary copy of the collection
#[derive(Clone, PartialEq)]
pub enum PrimaryBackend {
    Rest { url: String, token: String },
    Sqlite { url: String },
    Memory,
    None,
}

impl PrimaryBackend {
    pub fn name(&self) -> &'static str {
        match self {
            PrimaryBackend::Rest { .. } => "rest",
            PrimaryBackend::Sqlite { .. } => "sqlite",
            PrimaryBackend::Memory => "memory",
            PrimaryBackend::None => "none",
        }
    }
}

// The token must never reach the logs
impl fmt::Debug for PrimaryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryBackend::Rest { url, .. } => f
                .debug_struct("Rest")
                .field("url", url)
                .field("token", &"<redacted>")
                .finish(),
            PrimaryBackend::Sqlite { url } => f.debug_struct("Sqlite").field("url", url).finish(),
            PrimaryBackend::Memory => f.write_str("Memory"),
            PrimaryBackend::None => f.write_str("None"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                subscriber_fmt().json().with_env_filter(filter).init();
            }
            _ => {
                subscriber_fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

/// Presence of the hosting environment's variables, reported by /api/debug
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvFlags {
    pub has_kv_url: bool,
    pub has_kv_rest_api_token: bool,
    pub has_kv_rest_api_url: bool,
    pub is_vercel: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub primary: PrimaryBackend,
    pub predictions_key: String,
    pub ping_timeout: Duration,
    pub data_file: PathBuf,
    pub cors_allowed_origin: HeaderValue,
    pub static_dir: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub env_flags: EnvFlags,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let bind_addr_raw = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue { field: "BIND_ADDR", reason: e.to_string() })?;

        let ping_timeout = match var("KV_PING_TIMEOUT_MS") {
            Some(raw) => {
                let millis = raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    field: "KV_PING_TIMEOUT_MS",
                    reason: e.to_string(),
                })?;
                if millis == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "KV_PING_TIMEOUT_MS",
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_millis(millis)
            }
            None => Duration::from_millis(DEFAULT_PING_TIMEOUT_MS),
        };

        let env_flags = EnvFlags {
            has_kv_url: var("KV_URL").is_some(),
            has_kv_rest_api_token: var("KV_REST_API_TOKEN").is_some(),
            has_kv_rest_api_url: var("KV_REST_API_URL").is_some(),
            is_vercel: var("VERCEL").is_some(),
        };

        let primary = Self::primary_backend(&var)?;

        let data_file = var("PREDICTIONS_DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| JsonConnection::default_location(env_flags.is_vercel));

        let cors_raw = var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
        let cors_allowed_origin = cors_raw.parse::<HeaderValue>().map_err(|e| ConfigError::InvalidValue {
            field: "CORS_ALLOWED_ORIGIN",
            reason: e.to_string(),
        })?;

        let logging = LoggingConfig {
            level: var("RUST_LOG").unwrap_or_else(|| LoggingConfig::default().level),
            format: var("LOG_FORMAT").unwrap_or_else(|| LoggingConfig::default().format),
        };

        Ok(Self {
            bind_addr,
            primary,
            predictions_key: var("PREDICTIONS_KEY").unwrap_or_else(|| DEFAULT_PREDICTIONS_KEY.to_string()),
            ping_timeout,
            data_file,
            cors_allowed_origin,
            static_dir: var("STATIC_DIR").map(PathBuf::from),
            logging,
            env_flags,
        })
    }

    fn primary_backend<F>(var: &F) -> Result<PrimaryBackend, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rest_url = var("KV_REST_API_URL");
        let requested = var("PRIMARY_BACKEND").map(|value| value.trim().to_lowercase());

        let kind = match requested {
            Some(kind) => kind,
            None if rest_url.is_some() => "rest".to_string(),
            None => "none".to_string(),
        };

        match kind.as_str() {
            "rest" => {
                let url = rest_url.ok_or(ConfigError::MissingField { field: "KV_REST_API_URL" })?;
                let token = var("KV_REST_API_TOKEN").ok_or(ConfigError::MissingField { field: "KV_REST_API_TOKEN" })?;
                Ok(PrimaryBackend::Rest { url, token })
            }
            "sqlite" => Ok(PrimaryBackend::Sqlite {
                url: var("KV_DATABASE_URL").unwrap_or_else(|| DEFAULT_SQLITE_URL.to_string()),
            }),
            "memory" => Ok(PrimaryBackend::Memory),
            "none" => Ok(PrimaryBackend::None),
            other => Err(ConfigError::InvalidValue {
                field: "PRIMARY_BACKEND",
                reason: format!("unknown backend '{}', expected rest, sqlite, memory or none", other),
            }),
        }
    }
}
