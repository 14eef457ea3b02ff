//! SQL implementation of the appointment store
//!
//! The overlap check and the insert run as one statement, so two concurrent
//! bookings of intersecting intervals cannot both succeed even when they
//! come from different processes sharing the database.

use crate::error::DbError;
use crate::repositories::codec;
use crate::DbClient;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;
use termin_common::{
    Appointment, AppointmentStatus, AppointmentStore, InsertOutcome, NewAppointment, StoreResult,
};
use tracing::{debug, error, info, warn};

const APPOINTMENT_COLUMNS: &str =
    "id, token, user_id, date, time_start, time_end, status, appointment_type, created_at, updated_at";

const ACTIVE_STATUSES: &str = "('pending', 'confirmed')";

#[derive(Debug, Clone)]
pub struct SqlAppointmentRepository {
    db_client: DbClient,
}

impl SqlAppointmentRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing appointment schema");

        let table = r#"
            CREATE TABLE IF NOT EXISTS appointments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT NOT NULL UNIQUE,
                user_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                time_start TEXT NOT NULL,
                time_end TEXT NOT NULL,
                status TEXT NOT NULL,
                appointment_type TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(table).await?;
        self.db_client
            .execute("CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments (date)")
            .await?;
        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_appointments_user ON appointments (user_id, date)",
            )
            .await?;

        info!("Appointment schema initialized successfully");
        Ok(())
    }

    fn map_row(row: &AnyRow) -> Result<Appointment, DbError> {
        let status = codec::text(row, "status")?;
        Ok(Appointment {
            id: codec::int(row, "id")?,
            token: codec::text(row, "token")?,
            user_id: codec::int(row, "user_id")?,
            date: codec::date(row, "date")?,
            time_start: codec::time(row, "time_start")?,
            time_end: codec::time(row, "time_end")?,
            status: status
                .parse::<AppointmentStatus>()
                .map_err(|e| DbError::decode("status", e))?,
            appointment_type: codec::opt_text(row, "appointment_type")?,
            created_at: codec::timestamp(row, "created_at")?,
            updated_at: codec::timestamp(row, "updated_at")?,
        })
    }

    fn map_rows(rows: &[AnyRow]) -> Result<Vec<Appointment>, DbError> {
        rows.iter().map(Self::map_row).collect()
    }

    async fn fetch_by_date(&self, date: NaiveDate, active_only: bool) -> Result<Vec<Appointment>, DbError> {
        let filter = if active_only {
            format!("AND status IN {ACTIVE_STATUSES}")
        } else {
            String::new()
        };
        let query = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE date = $1 {filter} ORDER BY time_start, id"
        );

        let rows = sqlx::query(&query)
            .bind(codec::date_text(date))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to load appointments for {}: {}", date, e);
                DbError::QueryError(e.to_string())
            })?;
        Self::map_rows(&rows)
    }

    async fn fetch_one(&self, column: &str, value: BindKey<'_>) -> Result<Option<Appointment>, DbError> {
        let query = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE {column} = $1");
        let statement = sqlx::query(&query);
        let statement = match value {
            BindKey::Id(id) => statement.bind(id),
            BindKey::Token(token) => statement.bind(token.to_string()),
        };
        let row = statement
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        row.as_ref().map(Self::map_row).transpose()
    }
}

enum BindKey<'a> {
    Id(i64),
    Token(&'a str),
}

#[async_trait]
impl AppointmentStore for SqlAppointmentRepository {
    async fn active_on(&self, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        Ok(self.fetch_by_date(date, true).await?)
    }

    async fn all_on(&self, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        Ok(self.fetch_by_date(date, false).await?)
    }

    async fn count_active_for_user(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<u32> {
        let query = format!(
            "SELECT COUNT(*) AS n FROM appointments \
             WHERE user_id = $1 AND date >= $2 AND date <= $3 AND status IN {ACTIVE_STATUSES}"
        );
        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(codec::date_text(from))
            .bind(codec::date_text(to))
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        let count: i64 = row.try_get("n").map_err(|e| DbError::decode("n", e))?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn insert_if_free(&self, appointment: NewAppointment) -> StoreResult<InsertOutcome> {
        debug!(
            "Inserting appointment on {} {}-{}",
            appointment.date, appointment.time_start, appointment.time_end
        );

        let query = format!(
            r#"
            INSERT INTO appointments (token, user_id, date, time_start, time_end, appointment_type, status, created_at, updated_at)
            SELECT $1, $2, $3, $4, $5, $6, 'pending', $7, $7
            WHERE NOT EXISTS (
                SELECT 1 FROM appointments
                WHERE date = $3
                  AND status IN {ACTIVE_STATUSES}
                  AND time_start < $5
                  AND time_end > $4
            )
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(appointment.token)
            .bind(appointment.user_id)
            .bind(codec::date_text(appointment.date))
            .bind(codec::time_text(appointment.time_start))
            .bind(codec::time_text(appointment.time_end))
            .bind(appointment.appointment_type)
            .bind(codec::timestamp_text(Utc::now()))
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert appointment: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        match row {
            Some(row) => {
                let inserted = Self::map_row(&row)?;
                info!("Appointment {} created", inserted.id);
                Ok(InsertOutcome::Inserted(inserted))
            }
            None => {
                warn!("Appointment insert skipped, interval overlaps an active appointment");
                Ok(InsertOutcome::Overlap)
            }
        }
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Appointment>> {
        Ok(self.fetch_one("id", BindKey::Id(id)).await?)
    }

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<Appointment>> {
        Ok(self.fetch_one("token", BindKey::Token(token)).await?)
    }

    async fn update_status(
        &self,
        id: i64,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> StoreResult<Option<Appointment>> {
        let query = format!(
            "UPDATE appointments SET status = $1, updated_at = $2 \
             WHERE id = $3 AND status = $4 RETURNING {APPOINTMENT_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(status.as_str())
            .bind(codec::timestamp_text(Utc::now()))
            .bind(id)
            .bind(expected.as_str())
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to update appointment {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(row.as_ref().map(Self::map_row).transpose()?)
    }

    async fn active_for_user(&self, user_id: i64) -> StoreResult<Vec<Appointment>> {
        let query = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             WHERE user_id = $1 AND status IN {ACTIVE_STATUSES} ORDER BY date, time_start"
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(Self::map_rows(&rows)?)
    }
}
