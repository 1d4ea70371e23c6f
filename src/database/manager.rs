use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing::info;

use super::memory::MemoryStore;
use super::postgres::PgStore;
use super::schema::SchemaError;
use super::store::EntityStore;
use crate::config::{DatabaseConfig, StoreBackend};
use crate::filter::FilterError;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violated on `field`
    #[error("{field} already taken")]
    Duplicate { field: String },

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl From<FilterError> for DatabaseError {
    fn from(err: FilterError) -> Self {
        DatabaseError::QueryError(err.to_string())
    }
}

/// Builds the configured store backend.
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn EntityStore>, DatabaseError> {
        match config.store {
            StoreBackend::Memory => {
                info!("Using in-memory entity store");
                Ok(Arc::new(MemoryStore::new()))
            }
            StoreBackend::Postgres => {
                let store = Self::connect_postgres(config).await?;
                if config.run_migrations {
                    store.migrate().await?;
                }
                Ok(Arc::new(store))
            }
        }
    }

    pub async fn connect_postgres(config: &DatabaseConfig) -> Result<PgStore, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let parsed = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if !matches!(parsed.scheme(), "postgres" | "postgresql") {
            return Err(DatabaseError::InvalidDatabaseUrl);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected to PostgreSQL at {}", Self::redact_url(url));
        Ok(PgStore::new(pool))
    }

    /// Connection string with the password masked, for logs.
    pub fn redact_url(url: &str) -> String {
        match url::Url::parse(url) {
            Ok(mut parsed) => {
                if parsed.password().is_some() {
                    let _ = parsed.set_password(Some("***"));
                }
                parsed.into()
            }
            Err(_) => "<invalid url>".to_string(),
        }
    }
}
