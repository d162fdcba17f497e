//! Repository layer: entity-scoped database operations.
//!
//! Plain functions over a borrowed `Connection`. Callers decide the
//! connection and transaction scope; the aggregate writer and the cascade
//! policy open their own transaction via `in_transaction`.

mod appointment;
mod cascade;
mod department;
mod doctor;
mod feedback;
mod inventory;
mod patient;
mod prescription;
mod statistics;
mod user;

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rusqlite::types::Type;
use rusqlite::Row;

use super::sqlite::{DATE_FORMAT, TIMESTAMP_FORMAT};
use super::DatabaseError;

pub use appointment::*;
pub use cascade::*;
pub use department::*;
pub use doctor::*;
pub use feedback::*;
pub use inventory::*;
pub use patient::*;
pub use prescription::*;
pub use statistics::*;
pub use user::*;

// ═══════════════════════════════════════════════════════════
// Column helpers
// ═══════════════════════════════════════════════════════════

pub(crate) fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn format_date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

/// Current local time truncated to whole seconds, the stored precision.
pub(crate) fn now_timestamp() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn optional_timestamp_column(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<NaiveDateTime>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map(Some)
            .map_err(|e| conversion_error(idx, e)),
        None => Ok(None),
    }
}

pub(crate) fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn enum_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = DatabaseError>,
{
    let raw: String = row.get(idx)?;
    T::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn not_found(entity_type: &str, id: i64) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: entity_type.into(),
        id,
    }
}

// ═══════════════════════════════════════════════════════════
// Test fixtures
// ═══════════════════════════════════════════════════════════
