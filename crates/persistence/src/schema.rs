//! SQLite schema and helper functions

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OptionalExtension};

use crate::error::PersistenceError;

pub const LOCATION_TABLE: &str = "location";
pub const VOUCHER_TABLE: &str = "voucher";

pub(crate) const CREATE_LOCATION: &str = r#"
    CREATE TABLE location (
        name      TEXT NOT NULL,
        category  TEXT NOT NULL,
        x         INTEGER NOT NULL,
        y         INTEGER NOT NULL,
        zone      TEXT NOT NULL
    )
"#;

pub(crate) const CREATE_VOUCHER: &str = r#"
    CREATE TABLE voucher (
        id            INTEGER NOT NULL,
        name          TEXT NOT NULL,
        discount      REAL NOT NULL,
        min_price     REAL NOT NULL,
        expired_date  TEXT NOT NULL,
        category      TEXT
    )
"#;

/// Register `unicode_lower(text)`.
///
/// SQLite's built-in `lower()` only folds ASCII, which misses Vietnamese
/// product names.
pub fn register_functions(conn: &Connection) -> Result<(), PersistenceError> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value = ctx.get::<Option<String>>(0)?;
            Ok(value.map(|s| s.to_lowercase()))
        },
    )
    .map_err(|e| PersistenceError::SchemaError(format!("Failed to register unicode_lower: {}", e)))
}

/// Whether `table` exists
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool, PersistenceError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Fail with `NotLoaded` unless `table` exists
pub fn require_table(conn: &Connection, table: &str) -> Result<(), PersistenceError> {
    if table_exists(conn, table)? {
        Ok(())
    } else {
        Err(PersistenceError::NotLoaded(table.to_string()))
    }
}
