//! Storage implementations.
//!
//! The promo engine only talks to the `DiscountCodeStore` and
//! `RegistrationStore` traits. Backends:
//!
//! - `memory`: always available, process-local
//! - `sqlite`: feature `sqlite` (default)
//! - `postgres`: feature `postgres`

use std::sync::Arc;

use tracing::info;

use crate::config::{StorageConfig, StorageType};

mod discount_store;
pub mod memory;
mod registration_store;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod schema;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod sql;

pub use discount_store::DiscountCodeStore;
pub use memory::{MemoryDiscountCodeStore, MemoryRegistrationStore};
pub use registration_store::RegistrationStore;

#[cfg(feature = "postgres")]
pub use sql::postgres::{PostgresDiscountCodeStore, PostgresRegistrationStore};
#[cfg(feature = "sqlite")]
pub use sql::sqlite::{SqliteDiscountCodeStore, SqliteRegistrationStore};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Discount code already exists: {0}")]
    DuplicateCode(String),

    #[error("Invalid value in column {column}: {value}")]
    InvalidColumn { column: &'static str, value: String },

    #[error("Storage backend not enabled in this build: {0}")]
    BackendUnavailable(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(any(feature = "sqlite", feature = "postgres"))]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

/// The pair of stores the promo engine runs against.
#[derive(Clone)]
pub struct Stores {
    pub codes: Arc<dyn DiscountCodeStore>,
    pub registrations: Arc<dyn RegistrationStore>,
}

impl Stores {
    /// Fresh in-memory stores.
    pub fn memory() -> Self {
        Self {
            codes: Arc::new(MemoryDiscountCodeStore::new()),
            registrations: Arc::new(MemoryRegistrationStore::new()),
        }
    }

    /// Create tables for both stores.
    pub async fn init_schema(&self) -> Result<()> {
        self.codes.init_schema().await?;
        self.registrations.init_schema().await?;
        Ok(())
    }
}

/// Initialize storage based on configuration.
///
/// Connects the configured backend and creates its schema.
pub async fn init_storage(config: &StorageConfig) -> Result<Stores> {
    info!(storage_type = config.storage_type.as_str(), "Initializing storage");

    let stores = match config.storage_type {
        StorageType::Memory => Stores::memory(),
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            let pool = connect_sqlite(&config.sqlite).await?;
            Stores {
                codes: Arc::new(SqliteDiscountCodeStore::new(pool.clone())),
                registrations: Arc::new(SqliteRegistrationStore::new(pool)),
            }
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => {
            tracing::error!("SQLite storage requested but 'sqlite' feature is not enabled");
            return Err(StorageError::BackendUnavailable("sqlite"));
        }
        #[cfg(feature = "postgres")]
        StorageType::Postgres => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.postgres.max_connections)
                .connect(&config.postgres.uri)
                .await?;
            Stores {
                codes: Arc::new(PostgresDiscountCodeStore::new(pool.clone())),
                registrations: Arc::new(PostgresRegistrationStore::new(pool)),
            }
        }
        #[cfg(not(feature = "postgres"))]
        StorageType::Postgres => {
            tracing::error!("PostgreSQL storage requested but 'postgres' feature is not enabled");
            return Err(StorageError::BackendUnavailable("postgres"));
        }
    };

    stores.init_schema().await?;
    Ok(stores)
}

#[cfg(feature = "sqlite")]
async fn connect_sqlite(config: &crate::config::SqliteConfig) -> Result<sqlx::SqlitePool> {
    use sqlx::sqlite::SqlitePoolOptions;

    // Every connection to `sqlite::memory:` opens its own database.
    if config.path == ":memory:" {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        return Ok(pool);
    }

    if let Some(parent) = std::path::Path::new(&config.path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&format!("sqlite:{}?mode=rwc", config.path))
        .await?;
    Ok(pool)
}
