//! # configs
//!
//! Layered configuration for the relief exchange server.
//!
//! Sources, lowest precedence first:
//! 1. Defaults below
//! 2. `relief-exchange.toml` (or the file named by `RELIEF_CONFIG`), optional
//! 3. `RELIEF_`-prefixed environment variables, `__` between sections,
//!    e.g. `RELIEF_SERVER__PORT=9000` or `RELIEF_AUTH__JWT_SECRET=...`
//!
//! A `.env` file in the working directory is loaded into the environment
//! first.

use std::path::PathBuf;

use config::{Config, Environment, File, FileFormat};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "relief-exchange.toml";
pub const CONFIG_PATH_VAR: &str = "RELIEF_CONFIG";
pub const ENV_PREFIX: &str = "RELIEF";
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Used when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Required when `backend = "postgres"`.
    #[serde(default)]
    pub database_url: Option<SecretString>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// HS256 signing secret shared with the identity provider.
    pub jwt_secret: SecretString,

    #[serde(default = "default_issuer")]
    pub issuer: String,

    #[serde(default = "default_audience")]
    pub audience: String,

    /// Allowed clock skew when checking `exp`.
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,

    /// Lifetime of tokens signed locally for development.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

fn default_issuer() -> String {
    "relief-exchange".to_string()
}

fn default_audience() -> String {
    "relief-exchange-api".to_string()
}

fn default_leeway() -> u64 {
    30
}

fn default_token_ttl() -> i64 {
    3600
}

/// Exports `.env` into the process environment and returns the file used,
/// if one was found.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

impl AppConfig {
    /// Loads the config file and the environment, then validates. Call
    /// [`load_dotenv`] first for `.env` values to be visible.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        Self::from_config(config)
    }

    /// Parses a TOML document without consulting files or the environment.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let app: AppConfig = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.expose_secret().len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "auth.jwt_secret must be at least {MIN_JWT_SECRET_LEN} bytes"
            )));
        }
        if self.storage.backend == StorageBackend::Postgres
            && self
                .storage
                .database_url
                .as_ref()
                .is_none_or(|url| url.expose_secret().trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "storage.database_url is required for the postgres backend".into(),
            ));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.body_limit_bytes must be positive".into(),
            ));
        }
        Ok(())
    }
}
