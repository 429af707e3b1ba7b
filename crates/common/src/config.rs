//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Attendance and penalty engine tuning.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait when opening a connection.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Seconds to wait for a free pooled connection.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Seconds an unused connection stays in the pool.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Seconds before a connection is recycled.
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,
    /// Log every statement at debug level.
    #[serde(default)]
    pub sqlx_logging: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

/// Absence window and escalation thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Length of the trailing absence window, in days.
    #[serde(default = "default_absence_window_days")]
    pub absence_window_days: i64,
    /// Exact absence count that issues a warning.
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: u64,
    /// Exact absence count that issues a temporary restriction.
    #[serde(default = "default_restriction_threshold")]
    pub restriction_threshold: u64,
    /// Absence count from which every further absence issues a suspension.
    #[serde(default = "default_suspension_threshold")]
    pub suspension_threshold: u64,
    /// Lifetime of an automatic temporary restriction, in days.
    #[serde(default = "default_restriction_days")]
    pub restriction_days: i64,
    /// Lifetime of an automatic suspension, in days.
    #[serde(default = "default_suspension_days")]
    pub suspension_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            absence_window_days: default_absence_window_days(),
            warning_threshold: default_warning_threshold(),
            restriction_threshold: default_restriction_threshold(),
            suspension_threshold: default_suspension_threshold(),
            restriction_days: default_restriction_days(),
            suspension_days: default_suspension_days(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

const fn default_acquire_timeout_secs() -> u64 {
    10
}

const fn default_idle_timeout_secs() -> u64 {
    600
}

const fn default_max_lifetime_secs() -> u64 {
    1800
}

const fn default_absence_window_days() -> i64 {
    90
}

const fn default_warning_threshold() -> u64 {
    3
}

const fn default_restriction_threshold() -> u64 {
    5
}

const fn default_suspension_threshold() -> u64 {
    7
}

const fn default_restriction_days() -> i64 {
    30
}

const fn default_suspension_days() -> i64 {
    60
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `HUB_ENV`)
    /// 3. Environment variables with `HUB__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("HUB_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("HUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("HUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let engine = EngineConfig::default();
        assert_eq!(engine.absence_window_days, 90);
        assert_eq!(engine.warning_threshold, 3);
        assert_eq!(engine.restriction_threshold, 5);
        assert_eq!(engine.suspension_threshold, 7);
        assert_eq!(engine.restriction_days, 30);
        assert_eq!(engine.suspension_days, 60);
    }

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let raw = r#"
            [database]
            url = "postgres://localhost/hub"

            [engine]
            suspension_days = 14
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.acquire_timeout_secs, 10);
        assert_eq!(config.database.max_lifetime_secs, 1800);
        assert!(!config.database.sqlx_logging);
        assert!(!config.logging.json);
        assert_eq!(config.engine.suspension_days, 14);
        assert_eq!(config.engine.warning_threshold, 3);
    }
}
