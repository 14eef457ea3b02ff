// --- File: crates/termin_common/src/models.rs ---

// Data structures shared by the booking core and the storage adapters.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Serde helpers for wall-clock times rendered as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Lifecycle state of an appointment.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Blocked,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Blocked => "blocked",
        }
    }

    /// Whether an appointment in this state holds its time slot.
    pub fn occupies_slot(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    /// No transition leaves a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Blocked)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "blocked" => Ok(AppointmentStatus::Blocked),
            other => Err(format!("unknown appointment status: {other}")),
        }
    }
}

/// A person who booked at least once. Identified by normalized email.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub surname: String,
    pub middle_name: Option<String>,
    pub phone: Option<String>,
    pub origin_ip: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub surname: String,
    pub middle_name: Option<String>,
    pub phone: Option<String>,
    pub origin_ip: Option<String>,
    pub access_token: String,
}

/// A booked (or formerly booked) time interval on a date.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date", example = "2025-06-02"))]
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "09:00"))]
    pub time_start: NaiveTime,
    #[serde(with = "hhmm")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "09:30"))]
    pub time_end: NaiveTime,
    pub status: AppointmentStatus,
    pub appointment_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert an appointment. New appointments always start `pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub token: String,
    pub user_id: i64,
    pub date: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
    pub appointment_type: Option<String>,
}

impl NewAppointment {
    /// Half-open overlap test against an existing interval on the same date.
    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.time_start < end && start < self.time_end
    }
}

/// Result of the store's conditional insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(Appointment),
    /// An active appointment already overlaps the requested interval.
    Overlap,
}

/// A blocked identity: an IP, a user, an email, or any combination.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub id: i64,
    pub ip: Option<String>,
    pub user_id: Option<i64>,
    pub email: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewBlockEntry {
    pub ip: Option<String>,
    pub user_id: Option<i64>,
    pub email: Option<String>,
    pub reason: Option<String>,
}

impl NewBlockEntry {
    pub fn has_identity(&self) -> bool {
        self.ip.as_deref().is_some_and(|s| !s.is_empty())
            || self.user_id.is_some()
            || self.email.as_deref().is_some_and(|s| !s.is_empty())
    }
}

impl BlockEntry {
    /// Whether this entry covers any of the given identities.
    pub fn matches(&self, ip: Option<&str>, user_id: Option<i64>, email: Option<&str>) -> bool {
        let ip_hit = matches!((self.ip.as_deref(), ip), (Some(a), Some(b)) if a == b);
        let user_hit = matches!((self.user_id, user_id), (Some(a), Some(b)) if a == b);
        let email_hit =
            matches!((self.email.as_deref(), email), (Some(a), Some(b)) if a.eq_ignore_ascii_case(b));
        ip_hit || user_hit || email_hit
    }
}

/// Trims and lower-cases an email so it can serve as identity key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
