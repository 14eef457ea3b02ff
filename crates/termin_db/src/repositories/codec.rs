//! Text encodings for values the `Any` driver cannot decode natively.

use crate::error::DbError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M";

pub(crate) fn date_text(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn time_text(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub(crate) fn timestamp_text(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

pub(crate) fn text(row: &AnyRow, column: &str) -> Result<String, DbError> {
    row.try_get::<String, _>(column)
        .map_err(|e| DbError::decode(column, e))
}

pub(crate) fn opt_text(row: &AnyRow, column: &str) -> Result<Option<String>, DbError> {
    row.try_get::<Option<String>, _>(column)
        .map_err(|e| DbError::decode(column, e))
}

pub(crate) fn int(row: &AnyRow, column: &str) -> Result<i64, DbError> {
    row.try_get::<i64, _>(column)
        .map_err(|e| DbError::decode(column, e))
}

pub(crate) fn opt_int(row: &AnyRow, column: &str) -> Result<Option<i64>, DbError> {
    row.try_get::<Option<i64>, _>(column)
        .map_err(|e| DbError::decode(column, e))
}

pub(crate) fn date(row: &AnyRow, column: &str) -> Result<NaiveDate, DbError> {
    let raw = text(row, column)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| DbError::decode(column, e))
}

pub(crate) fn time(row: &AnyRow, column: &str) -> Result<NaiveTime, DbError> {
    let raw = text(row, column)?;
    NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(|e| DbError::decode(column, e))
}

pub(crate) fn timestamp(row: &AnyRow, column: &str) -> Result<DateTime<Utc>, DbError> {
    let raw = text(row, column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| DbError::decode(column, e))
}
