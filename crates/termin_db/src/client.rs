//! Database client for Termin
//!
//! Wraps a `sqlx::Any` pool so the repositories stay independent of the
//! concrete backend selected by the URL scheme.

use crate::error::DbError;
use sqlx::pool::PoolOptions;
use sqlx::Pool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use termin_config::DatabaseConfig;
use tracing::{debug, error, info};

/// Database client for Termin
#[derive(Debug, Clone)]
pub struct DbClient {
    /// The database connection pool
    pool: Pool<sqlx::Any>,
}

impl DbClient {
    /// Create a new database client from a database configuration
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    ///
    /// * The database URL is empty
    /// * The database connection fails
    pub async fn from_config(db_config: &DatabaseConfig) -> Result<Self, DbError> {
        if db_config.url.is_empty() {
            return Err(DbError::ConfigError("Database URL is empty".to_string()));
        }
        Self::from_url(&db_config.url).await
    }

    /// Create a new database client from a database URL
    pub async fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.is_empty() {
            return Err(DbError::UrlError("Database URL is empty".to_string()));
        }

        let pool = Self::create_pool(db_url).await?;
        Ok(Self { pool })
    }

    /// Private SQLite database living as long as the returned client.
    pub async fn in_memory() -> Result<Self, DbError> {
        Self::from_url("sqlite::memory:").await
    }

    async fn create_pool(db_url: &str) -> Result<Pool<sqlx::Any>, DbError> {
        debug!("Creating database pool with URL: {}", db_url);

        sqlx::any::install_default_drivers();

        // Every connection to ":memory:" opens its own database, so the pool
        // must hold exactly one connection and never recycle it.
        let in_memory = db_url.contains(":memory:");
        let pool_options = if in_memory {
            PoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            PoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .idle_timeout(Duration::from_secs(600))
        };

        if db_url.starts_with("sqlite:") && !in_memory {
            Self::ensure_sqlite_file(db_url)?;
        }

        let options = sqlx::any::AnyConnectOptions::from_str(db_url)
            .map_err(|e| DbError::UrlError(e.to_string()))?;
        let pool = pool_options.connect_with(options).await.map_err(|e| {
            error!("Failed to create database pool: {}", e);
            DbError::PoolError(e.to_string())
        })?;

        info!("Database pool created successfully");
        Ok(pool)
    }

    /// SQLite refuses to open a missing file through the `Any` driver, so the
    /// parent directory and an empty file are created up front.
    fn ensure_sqlite_file(db_url: &str) -> Result<(), DbError> {
        let db_path = db_url
            .strip_prefix("sqlite://")
            .or_else(|| db_url.strip_prefix("sqlite:"))
            .unwrap_or(db_url);
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        if db_path.is_empty() {
            return Ok(());
        }

        let path = Path::new(db_path);
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                debug!("Creating directory for SQLite database: {:?}", dir);
                std::fs::create_dir_all(dir).map_err(|e| {
                    error!("Failed to create directory for SQLite database: {}", e);
                    DbError::PoolError(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        if !path.exists() {
            debug!("Creating empty SQLite database file: {}", db_path);
            std::fs::File::create(path).map_err(|e| {
                error!("Failed to create SQLite database file: {}", e);
                DbError::PoolError(format!("Failed to create database file: {}", e))
            })?;
        }
        Ok(())
    }

    /// Get the database connection pool
    pub fn pool(&self) -> &Pool<sqlx::Any> {
        &self.pool
    }

    /// Execute a statement that returns no rows, yielding the affected row count
    pub async fn execute(&self, query: &str) -> Result<u64, DbError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| DbError::QueryError(e.to_string()))
    }

    /// Check if the database is healthy
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

impl std::fmt::Display for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DbClient")
    }
}
