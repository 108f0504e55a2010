//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The file path
//! defaults to `config.yaml` but can be specified via `-f` or the `QRGEN_CONFIG` environment
//! variable. A missing file is not an error; every field has a default.
//!
//! ## Loading Priority
//!
//! Later sources override earlier ones:
//!
//! 1. **YAML config file** - base configuration (default: `config.yaml`)
//! 2. **Environment variables** - variables prefixed with `QRGEN_`
//! 3. **DATABASE_URL** - switches to an external database at that URL
//!
//! Nested values use double underscores, e.g. `QRGEN_QR__MAX_PAGE_SIZE=50` or
//! `QRGEN_DATABASE__TYPE=memory`.
//!
//! ## Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 5000
//! database:
//!   type: external
//!   url: postgres://localhost:5432/qrgen
//! qr:
//!   max_payload_length: 4000
//!   error_correction: M
//! cors:
//!   allowed_origins: ["http://localhost:5173"]
//! frontend:
//!   static_dir: ./frontend/dist
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::errors::Error;
use crate::qr::encoder::ErrorCorrection;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "QRGEN_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Root configuration, loaded from YAML and environment variables.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Set from the raw `DATABASE_URL` env var; folded into `database` on load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Where QR code records are stored
    pub database: DatabaseConfig,
    /// Generation and listing limits
    pub qr: QrConfig,
    pub cors: CorsConfig,
    pub frontend: FrontendConfig,
    /// Maximum accepted request body in bytes
    pub max_body_size: usize,
    /// Expose Prometheus metrics at /internal/metrics
    pub enable_metrics: bool,
    /// Export spans over OTLP, configured through the standard OTEL_* env vars
    pub enable_otel_export: bool,
}

/// Database connection pool settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,  // 10 minutes
            max_lifetime_secs: 1800, // 30 minutes
        }
    }
}

impl PoolSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

/// Record storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseConfig {
    /// PostgreSQL at the given URL; migrations run on startup
    External {
        url: String,
        #[serde(default)]
        pool: PoolSettings,
    },
    /// Process-local store. Records are lost on restart.
    Memory,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::Memory
    }
}

impl DatabaseConfig {
    pub fn external_url(&self) -> Option<&str> {
        match self {
            DatabaseConfig::External { url, .. } => Some(url),
            DatabaseConfig::Memory => None,
        }
    }

    pub fn pool_settings(&self) -> PoolSettings {
        match self {
            DatabaseConfig::External { pool, .. } => pool.clone(),
            DatabaseConfig::Memory => PoolSettings::default(),
        }
    }
}

/// Limits applied by the record service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct QrConfig {
    /// Maximum length of the formatted payload, in characters
    pub max_payload_length: usize,
    /// Page size when a listing does not specify `limit`
    pub default_page_size: i64,
    /// Larger `limit` values are clamped to this
    pub max_page_size: i64,
    pub error_correction: ErrorCorrection,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            max_payload_length: 4000,
            default_page_size: 10,
            max_page_size: 100,
            error_correction: ErrorCorrection::M,
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub allowed_origins: Vec<CorsOrigin>,
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            // Development frontend (Vite)
            allowed_origins: vec![CorsOrigin::Url(Url::parse("http://localhost:5173").expect("static URL is valid"))],
            allow_credentials: true,
            max_age: Some(3600),
        }
    }
}

/// CORS origin specification: `*` or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

/// Serving of the single-page client build.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrontendConfig {
    /// Directory with the built assets; unknown routes fall back to its `index.html`
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            database_url: None,
            database: DatabaseConfig::default(),
            qr: QrConfig::default(),
            cors: CorsConfig::default(),
            frontend: FrontendConfig::default(),
            max_body_size: 10 * 1024 * 1024,
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // DATABASE_URL wins, keeping any configured pool settings
        if let Some(url) = config.database_url.take() {
            let pool = config.database.pool_settings();
            config.database = DatabaseConfig::External { url, pool };
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |message: String| Err(Error::Other(anyhow::anyhow!("Config validation: {message}")));

        if self.cors.allowed_origins.is_empty() {
            return invalid("CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string());
        }

        let has_wildcard = self.cors.allowed_origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard));
        if has_wildcard && self.cors.allow_credentials {
            return invalid("CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins.".to_string());
        }

        if let DatabaseConfig::External { url, pool } = &self.database {
            if url.trim().is_empty() {
                return invalid("database.url cannot be empty for an external database".to_string());
            }
            if pool.min_connections > pool.max_connections {
                return invalid(format!(
                    "database pool min_connections ({}) cannot be greater than max_connections ({})",
                    pool.min_connections, pool.max_connections
                ));
            }
        }

        if self.qr.max_payload_length == 0 {
            return invalid("qr.max_payload_length must be positive (default: 4000)".to_string());
        }

        if self.qr.default_page_size < 1 || self.qr.max_page_size < 1 {
            return invalid("qr.default_page_size and qr.max_page_size must be at least 1".to_string());
        }

        if self.qr.default_page_size > self.qr.max_page_size {
            return invalid(format!(
                "qr.default_page_size ({}) cannot be greater than qr.max_page_size ({})",
                self.qr.default_page_size, self.qr.max_page_size
            ));
        }

        if self.max_body_size == 0 {
            return invalid("max_body_size must be positive".to_string());
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables override specific values
            // QRGEN_CONFIG selects the file and is not a config key
            .merge(Env::prefixed("QRGEN_").ignore(&["CONFIG"]).split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
