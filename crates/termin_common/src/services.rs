// --- File: crates/termin_common/src/services.rs ---
//! Storage and notification abstractions.
//!
//! The booking core only talks to these traits. `termin-db` implements the
//! stores on SQL, `termin-booking` ships in-memory versions for tests and
//! database-less deployments.

use crate::models::{
    Appointment, AppointmentStatus, BlockEntry, InsertOutcome, NewAppointment, NewBlockEntry,
    NewUser, User,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use termin_config::AvailabilityConfig;
use thiserror::Error;

/// Error returned by every store operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Stored data is invalid: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// Inserts the user, or merges into the existing row with the same email:
    /// name and surname are replaced, optional fields only when supplied.
    /// The email and access token of an existing row are kept.
    async fn upsert(&self, user: NewUser) -> StoreResult<User>;
}

#[async_trait]
pub trait BlockStore: Send + Sync {
    /// True when any entry matches one of the given identities.
    async fn is_blocked(
        &self,
        ip: Option<&str>,
        user_id: Option<i64>,
        email: Option<&str>,
    ) -> StoreResult<bool>;

    async fn add(&self, entry: NewBlockEntry) -> StoreResult<BlockEntry>;

    async fn list(&self) -> StoreResult<Vec<BlockEntry>>;

    /// Returns false when no entry had this id.
    async fn remove(&self, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Active (pending or confirmed) appointments on `date`, ordered by start.
    async fn active_on(&self, date: NaiveDate) -> StoreResult<Vec<Appointment>>;

    /// All appointments on `date` regardless of status, ordered by start.
    async fn all_on(&self, date: NaiveDate) -> StoreResult<Vec<Appointment>>;

    /// Active appointments of `user_id` with a date in `[from, to]`.
    async fn count_active_for_user(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<u32>;

    /// Atomically inserts the appointment unless an active one overlaps it.
    async fn insert_if_free(&self, appointment: NewAppointment) -> StoreResult<InsertOutcome>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Appointment>>;

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<Appointment>>;

    /// Sets `status` only if the row is currently in `expected`.
    /// Returns the updated appointment, or `None` when the guard failed.
    async fn update_status(
        &self,
        id: i64,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> StoreResult<Option<Appointment>>;

    /// Active appointments belonging to `user_id`.
    async fn active_for_user(&self, user_id: i64) -> StoreResult<Vec<Appointment>>;
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self) -> StoreResult<Option<AvailabilityConfig>>;

    async fn save(&self, config: &AvailabilityConfig) -> StoreResult<()>;
}

/// What happened to an appointment.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewAppointment,
    AppointmentConfirmed,
    AppointmentCancelled,
    AppointmentBlocked,
}

/// Payload handed to a [`NotificationSink`] after a state change was persisted.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub appointment_id: i64,
    pub token: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date"))]
    pub date: NaiveDate,
    #[serde(with = "crate::models::hhmm")]
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub time_start: NaiveTime,
    #[serde(with = "crate::models::hhmm")]
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub time_end: NaiveTime,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    /// Signed admin links, present only for new bookings when a link secret is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn for_appointment(kind: NotificationKind, appointment: &Appointment) -> Self {
        Self {
            kind,
            appointment_id: appointment.id,
            token: appointment.token.clone(),
            date: appointment.date,
            time_start: appointment.time_start,
            time_end: appointment.time_end,
            user_email: None,
            user_name: None,
            confirm_url: None,
            cancel_url: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_user(mut self, user: &User) -> Self {
        self.user_email = Some(user.email.clone());
        self.user_name = Some(format!("{} {}", user.name, user.surname));
        self
    }
}

#[derive(Error, Debug)]
#[error("Notification delivery failed: {0}")]
pub struct NotificationError(pub String);

/// Receives events after the fact. Failures never roll back the change.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn emit(&self, event: &NotificationEvent) -> Result<(), NotificationError>;
}
