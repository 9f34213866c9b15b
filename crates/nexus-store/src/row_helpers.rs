//! Column readers that report bad data as `StoreError::CorruptRow` with the
//! table and column it came from.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::FromSql;
use rusqlite::Row;

use crate::error::StoreError;

fn corrupt(table: &'static str, column: &'static str, detail: impl ToString) -> StoreError {
    StoreError::CorruptRow {
        table,
        column,
        detail: detail.to_string(),
    }
}

/// Column `idx` as `T`. Nullable columns read as `Option<_>`.
pub fn get<T: FromSql>(
    row: &Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<T, StoreError> {
    row.get(idx).map_err(|e| corrupt(table, column, e))
}

/// A text column holding an enum's `as_str` form.
pub fn get_enum<T: std::str::FromStr>(
    row: &Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<T, StoreError> {
    let raw: String = get(row, idx, table, column)?;
    raw.parse()
        .map_err(|_| corrupt(table, column, format!("unknown variant: {raw}")))
}

/// An RFC 3339 timestamp column.
pub fn get_timestamp(
    row: &Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<DateTime<Utc>, StoreError> {
    let raw: String = get(row, idx, table, column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| corrupt(table, column, format!("invalid timestamp {raw:?}: {e}")))
}

/// A `COUNT`/`SUM` result, which must not be negative.
pub fn get_count(
    row: &Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<u64, StoreError> {
    let n: i64 = get(row, idx, table, column)?;
    u64::try_from(n).map_err(|_| corrupt(table, column, format!("negative count: {n}")))
}

/// Fixed-width UTC form so that lexical order in SQL matches time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
