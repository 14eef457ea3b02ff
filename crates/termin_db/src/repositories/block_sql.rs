//! SQL implementation of the block list

use crate::error::DbError;
use crate::repositories::codec;
use crate::DbClient;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::any::AnyRow;
use sqlx::Row;
use termin_common::{normalize_email, BlockEntry, BlockStore, NewBlockEntry, StoreResult};
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct SqlBlockRepository {
    db_client: DbClient,
}

impl SqlBlockRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing block list schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS blocks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ip TEXT,
                user_id INTEGER,
                email TEXT,
                reason TEXT,
                created_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;

        info!("Block list schema initialized successfully");
        Ok(())
    }

    fn map_row(row: &AnyRow) -> Result<BlockEntry, DbError> {
        Ok(BlockEntry {
            id: codec::int(row, "id")?,
            ip: codec::opt_text(row, "ip")?,
            user_id: codec::opt_int(row, "user_id")?,
            email: codec::opt_text(row, "email")?,
            reason: codec::opt_text(row, "reason")?,
            created_at: codec::timestamp(row, "created_at")?,
        })
    }
}

#[async_trait]
impl BlockStore for SqlBlockRepository {
    async fn is_blocked(
        &self,
        ip: Option<&str>,
        user_id: Option<i64>,
        email: Option<&str>,
    ) -> StoreResult<bool> {
        let query = r#"
            SELECT COUNT(*) AS hits FROM blocks
            WHERE (ip IS NOT NULL AND ip = $1)
               OR (user_id IS NOT NULL AND user_id = $2)
               OR (email IS NOT NULL AND email = $3)
        "#;

        let row = sqlx::query(query)
            .bind(ip.map(str::to_string))
            .bind(user_id)
            .bind(email.map(normalize_email))
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to query block list: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        let hits: i64 = row
            .try_get("hits")
            .map_err(|e| DbError::decode("hits", e))?;
        Ok(hits > 0)
    }

    async fn add(&self, entry: NewBlockEntry) -> StoreResult<BlockEntry> {
        debug!("Adding block entry");

        let query = r#"
            INSERT INTO blocks (ip, user_id, email, reason, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, ip, user_id, email, reason, created_at
        "#;

        let row = sqlx::query(query)
            .bind(entry.ip.filter(|ip| !ip.is_empty()))
            .bind(entry.user_id)
            .bind(
                entry
                    .email
                    .filter(|email| !email.is_empty())
                    .map(|email| normalize_email(&email)),
            )
            .bind(entry.reason)
            .bind(codec::timestamp_text(Utc::now()))
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert block entry: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        info!("Block entry created");
        Ok(Self::map_row(&row)?)
    }

    async fn list(&self) -> StoreResult<Vec<BlockEntry>> {
        let rows = sqlx::query(
            "SELECT id, ip, user_id, email, reason, created_at FROM blocks ORDER BY id",
        )
        .fetch_all(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        let entries = rows
            .iter()
            .map(Self::map_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    async fn remove(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM blocks WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to delete block entry: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }
}
