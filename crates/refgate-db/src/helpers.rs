//! Row parsing and SQL-building helpers.
//!
//! Every store needs to convert `libsql::Row` (column-indexed) into typed
//! structs. These helpers isolate the parsing logic and handle the dual
//! datetime format issue (`SQLite`'s `datetime('now')` vs Rust's
//! `to_rfc3339()`).

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};

use crate::error::DatabaseError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00+00:00"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Generate a prefixed random ID on `conn`. Returns e.g. `"aud-3fa8b2c10d9e4471"`.
///
/// # Errors
///
/// Returns `DatabaseError` if the query fails or returns no rows.
pub async fn generate_id(conn: &libsql::Connection, prefix: &str) -> Result<String, DatabaseError> {
    let mut rows = conn
        .query("SELECT ?1 || '-' || lower(hex(randomblob(8)))", [prefix])
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    Ok(row.get::<String>(0)?)
}

/// `?1, ?2, …, ?n` for an `IN (…)` list.
#[must_use]
pub fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

/// Reject anything that is not a plain SQL identifier.
///
/// Table and column names are interpolated into statements, so they must
/// never carry quotes, whitespace, or punctuation.
///
/// # Errors
///
/// Returns `DatabaseError::InvalidState` naming the bad identifier.
pub fn ensure_identifier(name: &str) -> Result<&str, DatabaseError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name)
    } else {
        Err(DatabaseError::InvalidState(format!(
            "'{name}' is not a valid SQL identifier"
        )))
    }
}

/// Convert a libSQL value into JSON for record snapshots.
#[must_use]
pub fn value_to_json(value: libsql::Value) -> JsonValue {
    match value {
        libsql::Value::Null => JsonValue::Null,
        libsql::Value::Integer(i) => JsonValue::from(i),
        libsql::Value::Real(f) => JsonValue::from(f),
        libsql::Value::Text(s) => JsonValue::String(s),
        libsql::Value::Blob(bytes) => JsonValue::from(bytes),
    }
}

/// Snapshot every column of `row` as a JSON object keyed by column name.
///
/// # Errors
///
/// Returns `DatabaseError` if a column cannot be read.
pub fn row_to_json_map(row: &libsql::Row) -> Result<Map<String, JsonValue>, DatabaseError> {
    let mut fields = Map::new();
    for idx in 0..row.column_count() {
        let name = row
            .column_name(idx)
            .ok_or_else(|| DatabaseError::Query(format!("column {idx} has no name")))?
            .to_string();
        fields.insert(name, value_to_json(row.get_value(idx)?));
    }
    Ok(fields)
}
