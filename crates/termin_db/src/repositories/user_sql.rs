//! SQL implementation of the user store

use crate::error::DbError;
use crate::repositories::codec;
use crate::DbClient;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::any::AnyRow;
use termin_common::{normalize_email, NewUser, StoreResult, User, UserStore};
use tracing::{debug, error, info};

const USER_COLUMNS: &str =
    "id, email, name, surname, middle_name, phone, origin_ip, access_token, created_at, updated_at";

/// SQL implementation of the user store
#[derive(Debug, Clone)]
pub struct SqlUserRepository {
    db_client: DbClient,
}

impl SqlUserRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing user schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                surname TEXT NOT NULL,
                middle_name TEXT,
                phone TEXT,
                origin_ip TEXT,
                access_token TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;

        info!("User schema initialized successfully");
        Ok(())
    }

    fn map_row(row: &AnyRow) -> Result<User, DbError> {
        Ok(User {
            id: codec::int(row, "id")?,
            email: codec::text(row, "email")?,
            name: codec::text(row, "name")?,
            surname: codec::text(row, "surname")?,
            middle_name: codec::opt_text(row, "middle_name")?,
            phone: codec::opt_text(row, "phone")?,
            origin_ip: codec::opt_text(row, "origin_ip")?,
            access_token: codec::text(row, "access_token")?,
            created_at: codec::timestamp(row, "created_at")?,
            updated_at: codec::timestamp(row, "updated_at")?,
        })
    }

    async fn find_one(&self, clause: &str, bind: BindValue<'_>) -> Result<Option<User>, DbError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}");
        let statement = sqlx::query(&query);
        let statement = match bind {
            BindValue::Text(value) => statement.bind(value.to_string()),
            BindValue::Int(value) => statement.bind(value),
        };
        let row = statement
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to load user: {}", e);
                DbError::QueryError(e.to_string())
            })?;
        row.as_ref().map(Self::map_row).transpose()
    }
}

enum BindValue<'a> {
    Text(&'a str),
    Int(i64),
}

#[async_trait]
impl UserStore for SqlUserRepository {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        Ok(self.find_one("email = $1", BindValue::Text(&email)).await?)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.find_one("id = $1", BindValue::Int(id)).await?)
    }

    async fn upsert(&self, user: NewUser) -> StoreResult<User> {
        let email = normalize_email(&user.email);
        debug!("Upserting user {}", email);

        let now = codec::timestamp_text(Utc::now());
        let query = format!(
            r#"
            INSERT INTO users (email, name, surname, middle_name, phone, origin_ip, access_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ON CONFLICT(email) DO UPDATE SET
                name = excluded.name,
                surname = excluded.surname,
                middle_name = COALESCE(excluded.middle_name, users.middle_name),
                phone = COALESCE(excluded.phone, users.phone),
                origin_ip = COALESCE(excluded.origin_ip, users.origin_ip),
                updated_at = excluded.updated_at
            RETURNING {USER_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(email)
            .bind(user.name)
            .bind(user.surname)
            .bind(user.middle_name)
            .bind(user.phone)
            .bind(user.origin_ip)
            .bind(user.access_token)
            .bind(now)
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to upsert user: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(Self::map_row(&row)?)
    }
}
