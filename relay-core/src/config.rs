use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, Map};
use serde::Deserialize;

/// Default request body limit: 50 MiB, enough for inline base64 images.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

/// Upper bound for any configured timeout (one day). Larger values are
/// clamped at load so `Instant::now() + timeout` cannot overflow.
pub const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub body_limit_bytes: usize,
}

impl HttpConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Flat key layout shared by the environment and the optional config file.
/// `DB_HOST` in the environment and `db_host` in a TOML file name the same key.
#[derive(Debug, Deserialize)]
struct FlatSettings {
    db_host: String,
    db_port: u16,
    db_user: String,
    db_password: String,
    db_name: String,
    db_max_connections: u32,
    db_acquire_timeout_secs: u64,
    host: String,
    port: u16,
    body_limit_bytes: usize,
    third_party_url: String,
    third_party_timeout_secs: u64,
}

impl From<FlatSettings> for RelayConfig {
    fn from(s: FlatSettings) -> Self {
        Self {
            database: DatabaseConfig {
                host: s.db_host,
                port: s.db_port,
                user: s.db_user,
                password: s.db_password,
                name: s.db_name,
                max_connections: s.db_max_connections,
                acquire_timeout_seconds: s.db_acquire_timeout_secs.min(MAX_TIMEOUT_SECS),
            },
            http: HttpConfig {
                host: s.host,
                port: s.port,
                body_limit_bytes: s.body_limit_bytes,
            },
            upstream: UpstreamConfig {
                base_url: s.third_party_url,
                timeout_seconds: s.third_party_timeout_secs.min(MAX_TIMEOUT_SECS),
            },
        }
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("db_host", "localhost")?
        .set_default("db_port", 5432)?
        .set_default("db_user", "root")?
        .set_default("db_password", "")?
        .set_default("db_name", "test_db")?
        .set_default("db_max_connections", 10)?
        .set_default("db_acquire_timeout_secs", 30)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 3000)?
        .set_default("body_limit_bytes", DEFAULT_BODY_LIMIT_BYTES as u64)?
        .set_default("third_party_url", "http://127.0.0.1:8000")?
        .set_default("third_party_timeout_secs", 30)
}

impl RelayConfig {
    /// Defaults, then the optional file at `path`, then process environment.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        Self::build(path, None)
    }

    /// Same layering as [`RelayConfig::load`] but reads variables from `vars`
    /// instead of the process environment.
    pub fn load_from_vars(
        path: Option<&str>,
        vars: Map<String, String>,
    ) -> Result<Self, ConfigError> {
        Self::build(path, Some(vars))
    }

    fn build(
        path: Option<&str>,
        vars: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = with_defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let s = builder
            .add_source(Environment::default().source(vars))
            .build()?;
        let flat: FlatSettings = s.try_deserialize()?;
        Ok(flat.into())
    }
}
