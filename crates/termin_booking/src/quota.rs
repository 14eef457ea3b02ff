// --- File: crates/termin_booking/src/quota.rs ---

use crate::calendar::iso_week_bounds;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use termin_common::{AppointmentStore, StoreError};
use termin_config::AvailabilityConfig;
use tracing::debug;

/// Which booking cap was hit.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaLimit {
    Daily,
    Weekly,
}

impl fmt::Display for QuotaLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaLimit::Daily => f.write_str("daily"),
            QuotaLimit::Weekly => f.write_str("weekly"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub reason: Option<QuotaLimit>,
}

impl QuotaDecision {
    pub const ALLOWED: QuotaDecision = QuotaDecision {
        allowed: true,
        reason: None,
    };

    fn rejected(limit: QuotaLimit) -> Self {
        Self {
            allowed: false,
            reason: Some(limit),
        }
    }
}

/// Applies the configured caps to already-counted bookings. A limit of 0 means unlimited.
pub fn evaluate_quota(daily_count: u32, weekly_count: u32, config: &AvailabilityConfig) -> QuotaDecision {
    if config.daily_booking_limit > 0 && daily_count >= config.daily_booking_limit {
        return QuotaDecision::rejected(QuotaLimit::Daily);
    }
    if config.weekly_booking_limit > 0 && weekly_count >= config.weekly_booking_limit {
        return QuotaDecision::rejected(QuotaLimit::Weekly);
    }
    QuotaDecision::ALLOWED
}

/// Counts the user's active bookings on `date` and in its ISO week.
///
/// `user_id = None` is a user that does not exist yet and therefore has no bookings.
pub async fn check_quota(
    store: &dyn AppointmentStore,
    user_id: Option<i64>,
    date: NaiveDate,
    config: &AvailabilityConfig,
) -> Result<QuotaDecision, StoreError> {
    let Some(user_id) = user_id else {
        return Ok(QuotaDecision::ALLOWED);
    };
    if config.daily_booking_limit == 0 && config.weekly_booking_limit == 0 {
        return Ok(QuotaDecision::ALLOWED);
    }

    let daily = if config.daily_booking_limit > 0 {
        store.count_active_for_user(user_id, date, date).await?
    } else {
        0
    };
    let weekly = if config.weekly_booking_limit > 0 {
        let (monday, sunday) = iso_week_bounds(date);
        store.count_active_for_user(user_id, monday, sunday).await?
    } else {
        0
    };

    debug!(
        "Quota for user {} on {}: {} today, {} this week",
        user_id, date, daily, weekly
    );
    Ok(evaluate_quota(daily, weekly, config))
}
