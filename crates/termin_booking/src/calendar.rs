// --- File: crates/termin_booking/src/calendar.rs ---

// Date arithmetic and the business clock.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use std::str::FromStr;
use tracing::warn;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Monday and Sunday of the ISO week containing `date`.
pub fn iso_week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = i64::from(date.weekday().num_days_from_monday());
    let monday = date - Duration::days(offset);
    (monday, monday + Duration::days(6))
}

/// Every date from `start` to `end`, both inclusive. Empty when `end < start`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Strict `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Strict zero-padded `HH:MM`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    if raw.len() != 5 {
        return None;
    }
    NaiveTime::parse_from_str(raw, TIME_FORMAT).ok()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Minutes since midnight.
pub fn minutes_of_day(time: NaiveTime) -> u32 {
    use chrono::Timelike;
    time.hour() * 60 + time.minute()
}

/// Inverse of [`minutes_of_day`], `None` past 23:59.
pub fn time_from_minutes(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

/// Source of "now" as a wall-clock time in the business time zone.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Reads the system clock, converted to a configured zone or the server's local zone.
#[derive(Debug, Clone, Default)]
pub struct SystemClock {
    zone: Option<Tz>,
}

impl SystemClock {
    pub fn new(zone: Option<Tz>) -> Self {
        Self { zone }
    }

    /// Parses an IANA name. Unknown names fall back to local time with a warning.
    pub fn from_zone_name(name: Option<&str>) -> Self {
        let zone = name.and_then(|name| match Tz::from_str(name) {
            Ok(tz) => Some(tz),
            Err(_) => {
                warn!("Unknown time zone '{}', using server local time", name);
                None
            }
        });
        Self { zone }
    }

    pub fn zone(&self) -> Option<Tz> {
        self.zone
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let utc: DateTime<Utc> = Utc::now();
        match self.zone {
            Some(tz) => utc.with_timezone(&tz).naive_local(),
            None => utc.with_timezone(&Local).naive_local(),
        }
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
