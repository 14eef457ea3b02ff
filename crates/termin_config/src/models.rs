// --- File: crates/termin_config/src/models.rs ---

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// IANA time zone the business operates in (e.g. "Europe/Zurich").
    /// When unset, the server's local time zone is used.
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. "sqlite://data/termin.db", loaded via TERMIN__DATABASE__URL
}

// --- Admin Config ---
// Secrets are usually "secret_from_env" markers, resolved to ADMIN_API_KEY / ADMIN_LINK_SECRET.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AdminConfig {
    pub api_key: Option<String>,
    pub link_secret: Option<String>,
    pub public_base_url: Option<String>,
}

// --- Notification Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct NotificationConfig {
    /// Endpoint receiving notification events as JSON. Events are only logged when unset.
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    /// Directory for daily-rolling log files; stdout only when unset.
    pub directory: Option<String>,
}

/// Reasons an availability configuration is refused on write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("start_hour ({start}) must be before end_hour ({end})")]
    HoursOutOfOrder { start: u32, end: u32 },
    #[error("start_hour must be between 0 and 23, got {0}")]
    StartHourOutOfRange(u32),
    #[error("end_hour must be between 1 and 23, got {0}")]
    EndHourOutOfRange(u32),
    #[error("slot_granularity_minutes must be 30 or 60, got {0}")]
    UnsupportedGranularity(u32),
    #[error("default_duration_minutes must be a positive multiple of 30 within business hours, got {0}")]
    InvalidDuration(u32),
}

/// Business hours and booking rules, admin-mutable.
///
/// Requests never read this from a global; each one captures an
/// `Arc<AvailabilityConfig>` snapshot and passes it down.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AvailabilityConfig {
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,
    #[serde(default = "default_granularity")]
    pub slot_granularity_minutes: u32,
    #[serde(default)]
    pub include_weekend: bool,
    /// Weeks ahead that slots are offered. 0 disables the horizon.
    #[serde(default = "default_horizon_weeks")]
    pub display_horizon_weeks: u32,
    /// No slot starting before this local instant is bookable.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, example = "2025-06-02T12:00:00"))]
    pub lock_until: Option<NaiveDateTime>,
    /// Locks every slot when `lock_until` is unset.
    #[serde(default)]
    pub locked: bool,
    /// Per user and day, 0 = unlimited.
    #[serde(default)]
    pub daily_booking_limit: u32,
    /// Per user and ISO week, 0 = unlimited.
    #[serde(default)]
    pub weekly_booking_limit: u32,
    /// Appointment length when the client does not send one. Defaults to the granularity.
    #[serde(default)]
    pub default_duration_minutes: Option<u32>,
}

fn default_start_hour() -> u32 {
    9
}

fn default_end_hour() -> u32 {
    17
}

fn default_granularity() -> u32 {
    30
}

fn default_horizon_weeks() -> u32 {
    4
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            slot_granularity_minutes: default_granularity(),
            include_weekend: false,
            display_horizon_weeks: default_horizon_weeks(),
            lock_until: None,
            locked: false,
            daily_booking_limit: 0,
            weekly_booking_limit: 0,
            default_duration_minutes: None,
        }
    }
}

impl AvailabilityConfig {
    /// Checks the invariants that must hold before a config is stored.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.start_hour > 23 {
            return Err(ConfigValidationError::StartHourOutOfRange(self.start_hour));
        }
        if self.end_hour == 0 || self.end_hour > 23 {
            return Err(ConfigValidationError::EndHourOutOfRange(self.end_hour));
        }
        if self.start_hour >= self.end_hour {
            return Err(ConfigValidationError::HoursOutOfOrder {
                start: self.start_hour,
                end: self.end_hour,
            });
        }
        if !matches!(self.slot_granularity_minutes, 30 | 60) {
            return Err(ConfigValidationError::UnsupportedGranularity(
                self.slot_granularity_minutes,
            ));
        }
        if let Some(duration) = self.default_duration_minutes {
            if duration == 0 || duration % 30 != 0 || duration > self.opening_minutes() {
                return Err(ConfigValidationError::InvalidDuration(duration));
            }
        }
        Ok(())
    }

    /// Length of the business day; no appointment can be longer.
    pub fn opening_minutes(&self) -> u32 {
        self.end_hour.saturating_sub(self.start_hour) * 60
    }

    /// Duration used when a request does not specify one.
    pub fn effective_duration_minutes(&self) -> u32 {
        self.default_duration_minutes
            .unwrap_or(self.slot_granularity_minutes)
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_notifications: bool,

    #[serde(default)]
    pub availability: AvailabilityConfig,

    // --- Optional Sections ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>, // in-memory stores when absent
    #[serde(default)]
    pub admin: Option<AdminConfig>,
    #[serde(default)]
    pub notifications: Option<NotificationConfig>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                time_zone: None,
                request_timeout_secs: None,
            },
            use_notifications: false,
            availability: AvailabilityConfig::default(),
            database: None,
            admin: None,
            notifications: None,
            logging: None,
        }
    }
}
