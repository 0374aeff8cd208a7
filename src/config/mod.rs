//! Application configuration.
//!
//! Aggregates configuration from all modules into a single Config struct
//! that can be loaded from YAML files or environment variables. The loaded
//! value is handed to the services explicitly; nothing reads settings from
//! process-wide state after startup.

mod promo;
mod storage;

pub use promo::{
    CouponConfig, ReconciliationConfig, DEFAULT_LOCAL_FRAGMENT_LEN,
    DEFAULT_PENDING_TIMEOUT_MINUTES, DEFAULT_SUFFIX_DIGITS,
};
pub use storage::{PostgresConfig, SqliteConfig, StorageConfig, StorageType};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "ACADEMY_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "ACADEMY";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "ACADEMY_LOG";

use serde::Deserialize;

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Generated coupon shape.
    pub coupons: CouponConfig,
    /// Reconciliation settings.
    pub reconciliation: ReconciliationConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `config.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix, e.g.
    ///    `ACADEMY__STORAGE__TYPE=postgres`
    pub fn load(path: Option<&str>) -> Result<Self, ::config::ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail later, at use.
    pub fn validate(&self) -> Result<(), ::config::ConfigError> {
        if self.reconciliation.pending_timeout().is_none() {
            return Err(::config::ConfigError::Message(format!(
                "reconciliation.pending_timeout_minutes out of range: {}",
                self.reconciliation.pending_timeout_minutes
            )));
        }
        Ok(())
    }

    /// Create config for testing: in-memory storage, default settings.
    pub fn for_test() -> Self {
        Self {
            storage: StorageConfig::memory(),
            ..Self::default()
        }
    }
}
