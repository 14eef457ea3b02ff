//! Builds the full set of SQL stores from configuration.

use crate::client::DbClient;
use crate::error::DbError;
use crate::repositories::{
    SqlAppointmentRepository, SqlBlockRepository, SqlConfigRepository, SqlUserRepository,
};
use std::sync::Arc;
use termin_config::{AppConfig, DatabaseConfig};
use tracing::debug;

/// All repositories sharing one pool, with their schemas initialized.
#[derive(Debug, Clone)]
pub struct SqlStores {
    pub client: DbClient,
    pub users: Arc<SqlUserRepository>,
    pub blocks: Arc<SqlBlockRepository>,
    pub appointments: Arc<SqlAppointmentRepository>,
    pub config: Arc<SqlConfigRepository>,
}

/// Factory for creating database clients and store bundles
#[derive(Debug, Clone, Default)]
pub struct DbClientFactory;

impl DbClientFactory {
    pub fn new() -> Self {
        Self
    }

    /// Connects using the `[database]` section of the application config.
    ///
    /// # Errors
    ///
    /// Fails when the section is missing or the connection cannot be made.
    pub async fn from_app_config(&self, config: &AppConfig) -> Result<SqlStores, DbError> {
        let db_config = config
            .database
            .as_ref()
            .ok_or_else(|| DbError::ConfigError("Database configuration is missing".to_string()))?;
        self.from_db_config(db_config).await
    }

    pub async fn from_db_config(&self, db_config: &DatabaseConfig) -> Result<SqlStores, DbError> {
        debug!("Creating SQL stores from database configuration");
        let client = DbClient::from_config(db_config).await?;
        SqlStores::init(client).await
    }

    /// Stores backed by a private in-memory SQLite database.
    pub async fn in_memory(&self) -> Result<SqlStores, DbError> {
        let client = DbClient::in_memory().await?;
        SqlStores::init(client).await
    }
}

impl SqlStores {
    /// Wraps `client` in every repository and creates missing tables.
    pub async fn init(client: DbClient) -> Result<Self, DbError> {
        let stores = Self {
            users: Arc::new(SqlUserRepository::new(client.clone())),
            blocks: Arc::new(SqlBlockRepository::new(client.clone())),
            appointments: Arc::new(SqlAppointmentRepository::new(client.clone())),
            config: Arc::new(SqlConfigRepository::new(client.clone())),
            client,
        };
        stores.users.init_schema().await?;
        stores.blocks.init_schema().await?;
        stores.appointments.init_schema().await?;
        stores.config.init_schema().await?;
        Ok(stores)
    }
}
