//! Persists the admin-editable availability configuration as a JSON document.

use crate::error::DbError;
use crate::repositories::codec;
use crate::DbClient;
use async_trait::async_trait;
use chrono::Utc;
use termin_common::{ConfigStore, StoreResult};
use termin_config::AvailabilityConfig;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct SqlConfigRepository {
    db_client: DbClient,
}

impl SqlConfigRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        let query = r#"
            CREATE TABLE IF NOT EXISTS availability_config (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;

        info!("Availability config schema initialized successfully");
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for SqlConfigRepository {
    async fn load(&self) -> StoreResult<Option<AvailabilityConfig>> {
        let row = sqlx::query("SELECT body FROM availability_config WHERE id = 1")
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let body = codec::text(&row, "body")?;
        let config =
            serde_json::from_str(&body).map_err(|e| DbError::decode("body", e))?;
        Ok(Some(config))
    }

    async fn save(&self, config: &AvailabilityConfig) -> StoreResult<()> {
        debug!("Saving availability config");

        let body = serde_json::to_string(config).map_err(|e| DbError::decode("body", e))?;
        sqlx::query(
            r#"
            INSERT INTO availability_config (id, body, updated_at) VALUES (1, $1, $2)
            ON CONFLICT(id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at
            "#,
        )
        .bind(body)
        .bind(codec::timestamp_text(Utc::now()))
        .execute(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to save availability config: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        Ok(())
    }
}
