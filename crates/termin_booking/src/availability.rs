// --- File: crates/termin_booking/src/availability.rs ---

//! Pure slot computation.
//!
//! Everything here works on minutes since midnight and takes "now" as an
//! argument, so identical inputs always yield identical output.

use crate::calendar::{format_time, is_weekend, minutes_of_day, time_from_minutes};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use termin_common::Appointment;
use termin_config::AvailabilityConfig;

/// Half-open `[start, end)` interval occupied on a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl BookedInterval {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    fn overlaps_minutes(&self, start: u32, end: u32) -> bool {
        minutes_of_day(self.start) < end && start < minutes_of_day(self.end)
    }
}

impl From<&Appointment> for BookedInterval {
    fn from(appointment: &Appointment) -> Self {
        Self::new(appointment.time_start, appointment.time_end)
    }
}

/// First rule that rules a start time out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotExclusion {
    InvalidDuration,
    NotOnGrid,
    OutsideHours,
    Past,
    Weekend,
    BeyondHorizon,
    Locked,
    Overlap,
}

impl fmt::Display for SlotExclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SlotExclusion::InvalidDuration => "duration must be positive",
            SlotExclusion::NotOnGrid => "start is not on the slot grid",
            SlotExclusion::OutsideHours => "appointment would end after business hours",
            SlotExclusion::Past => "slot lies in the past",
            SlotExclusion::Weekend => "weekends are not bookable",
            SlotExclusion::BeyondHorizon => "date is beyond the booking horizon",
            SlotExclusion::Locked => "booking is locked for this slot",
            SlotExclusion::Overlap => "slot overlaps an existing appointment",
        };
        f.write_str(text)
    }
}

/// Every candidate start, as minutes of day, regardless of bookings.
fn grid_minutes(config: &AvailabilityConfig) -> impl Iterator<Item = u32> {
    let open = config.start_hour * 60;
    let close = config.end_hour * 60;
    let step = config.slot_granularity_minutes.max(1) as usize;
    (open..close).step_by(step)
}

/// All candidate starts of the configured grid.
pub fn slot_grid(config: &AvailabilityConfig) -> Vec<NaiveTime> {
    grid_minutes(config).filter_map(time_from_minutes).collect()
}

/// Date-level exclusions shared by every slot of `date`.
fn exclude_date(
    date: NaiveDate,
    config: &AvailabilityConfig,
    now: NaiveDateTime,
) -> Option<SlotExclusion> {
    if is_weekend(date) && !config.include_weekend {
        return Some(SlotExclusion::Weekend);
    }
    if config.display_horizon_weeks > 0 {
        let horizon = now
            .date()
            .checked_add_signed(Duration::days(i64::from(config.display_horizon_weeks) * 7));
        if horizon.is_some_and(|horizon| date > horizon) {
            return Some(SlotExclusion::BeyondHorizon);
        }
    }
    None
}

fn is_locked(slot_at: NaiveDateTime, config: &AvailabilityConfig) -> bool {
    match config.lock_until {
        Some(until) => slot_at < until,
        None => config.locked,
    }
}

fn exclude_slot(
    date: NaiveDate,
    start: u32,
    config: &AvailabilityConfig,
    booked: &[BookedInterval],
    now: NaiveDateTime,
    duration_minutes: u32,
) -> Option<SlotExclusion> {
    let Some(end) = start.checked_add(duration_minutes) else {
        return Some(SlotExclusion::OutsideHours);
    };
    if end > config.end_hour * 60 {
        return Some(SlotExclusion::OutsideHours);
    }
    let Some(start_time) = time_from_minutes(start) else {
        return Some(SlotExclusion::OutsideHours);
    };
    let slot_at = date.and_time(start_time);
    if slot_at < now {
        return Some(SlotExclusion::Past);
    }
    if let Some(reason) = exclude_date(date, config, now) {
        return Some(reason);
    }
    if is_locked(slot_at, config) {
        return Some(SlotExclusion::Locked);
    }
    if booked.iter().any(|b| b.overlaps_minutes(start, end)) {
        return Some(SlotExclusion::Overlap);
    }
    None
}

/// Ordered `HH:MM` starts on `date` where an appointment of `duration_minutes` fits.
pub fn compute_available_slots(
    date: NaiveDate,
    config: &AvailabilityConfig,
    booked: &[BookedInterval],
    now: NaiveDateTime,
    duration_minutes: u32,
) -> Vec<String> {
    if duration_minutes == 0 || exclude_date(date, config, now).is_some() {
        return Vec::new();
    }
    grid_minutes(config)
        .filter(|start| exclude_slot(date, *start, config, booked, now, duration_minutes).is_none())
        .filter_map(time_from_minutes)
        .map(format_time)
        .collect()
}

/// Why `start` is not bookable, or `None` when it is.
pub fn explain_slot(
    date: NaiveDate,
    start: NaiveTime,
    config: &AvailabilityConfig,
    booked: &[BookedInterval],
    now: NaiveDateTime,
    duration_minutes: u32,
) -> Option<SlotExclusion> {
    if duration_minutes == 0 {
        return Some(SlotExclusion::InvalidDuration);
    }
    let start_minutes = minutes_of_day(start);
    if !grid_minutes(config).any(|m| m == start_minutes) {
        return Some(SlotExclusion::NotOnGrid);
    }
    exclude_slot(date, start_minutes, config, booked, now, duration_minutes)
}
