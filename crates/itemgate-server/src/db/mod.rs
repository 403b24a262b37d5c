use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::config::DatabaseConfig;

pub mod items;

pub use items::{InMemoryItemStore, ItemRecord, ItemStore, NewItem, PgItemStore};

/// Database operation errors with contextual information
#[derive(Error, Debug)]
pub enum DbError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration could not be applied
    #[error("Database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Database configuration is invalid or missing
    #[error("Database configuration error: {0}. Check POSTGRESQL_URL and POSTGRESQL_DATABASE.")]
    Config(String),

    /// Requested record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Record already exists (unique constraint violation)
    #[error("{0}")]
    Duplicate(String),
}

impl DbError {
    /// Create a not found error with resource context
    pub fn not_found(resource_type: &str, identifier: &str) -> Self {
        Self::NotFound(format!("{} '{}' not found", resource_type, identifier))
    }

    /// Create a duplicate error with resource context
    pub fn duplicate(resource_type: &str, identifier: &str) -> Self {
        Self::Duplicate(format!("{} '{}' already exists", resource_type, identifier))
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Classify a write failure, turning unique violations into [`DbError::Duplicate`]
    pub fn from_write(err: sqlx::Error, resource_type: &str, identifier: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::duplicate(resource_type, identifier);
            }
        }
        Self::Sqlx(err)
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub database: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

impl From<&DatabaseConfig> for DbConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            database: config.database.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
        }
    }
}

impl DbConfig {
    /// Connection options from the URL with the database name replaced
    pub fn connect_options(&self) -> DbResult<PgConnectOptions> {
        let options = PgConnectOptions::from_str(&self.url)
            .map_err(|e| DbError::config(format!("invalid POSTGRESQL_URL: {}", e)))?;
        Ok(options.database(&self.database))
    }
}

pub async fn create_pool(config: &DbConfig) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_with(config.connect_options()?)
        .await?;

    tracing::info!(
        database = %config.database,
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Apply the embedded migrations; already applied ones are skipped
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

pub async fn health_check(pool: &PgPool) -> DbResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(DbError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> DbConfig {
        DbConfig {
            url: url.to_string(),
            database: "items".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 10,
        }
    }

    #[test]
    fn test_connect_options_override_database() {
        let options = config("postgres://user:pw@db.internal:5432/postgres")
            .connect_options()
            .unwrap();
        assert_eq!(options.get_database(), Some("items"));
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 5432);
    }

    #[test]
    fn test_connect_options_reject_garbage_url() {
        let result = config("not a url").connect_options();
        assert!(matches!(result, Err(DbError::Config(_))));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DbError::not_found("Item", "42").to_string(),
            "Item '42' not found"
        );
        assert_eq!(
            DbError::duplicate("Item", "groceries").to_string(),
            "Item 'groceries' already exists"
        );
    }

    #[test]
    fn test_from_write_keeps_other_errors() {
        let err = DbError::from_write(sqlx::Error::RowNotFound, "Item", "x");
        assert!(matches!(err, DbError::Sqlx(sqlx::Error::RowNotFound)));
    }
}
