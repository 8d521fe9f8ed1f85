//! Shared helpers for messenger database operations.

use std::io;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, Params, Row};

use crate::error::{MessengerError, MessengerResult};

pub(crate) fn map_db_err(err: &rusqlite::Error) -> MessengerError {
    MessengerError::StoreUnavailable(err.to_string())
}

pub(crate) fn map_io_err(err: &io::Error) -> MessengerError {
    MessengerError::StoreUnavailable(err.to_string())
}

/// Returns whether `err` is a `UNIQUE` constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub(crate) fn to_i64(value: u64, label: &str) -> MessengerResult<i64> {
    i64::try_from(value).map_err(|_| {
        MessengerError::StoreUnavailable(format!("{label} out of range for i64: {value}"))
    })
}

pub(crate) fn to_u64(value: i64, label: &str) -> MessengerResult<u64> {
    u64::try_from(value).map_err(|_| {
        MessengerError::StoreUnavailable(format!("{label} out of range for u64: {value}"))
    })
}

/// Parses a snake case enum column.
pub(crate) fn parse_column<T: FromStr>(raw: &str, label: &str) -> MessengerResult<T> {
    raw.parse().map_err(|_| {
        MessengerError::StoreUnavailable(format!("invalid {label} {raw:?}"))
    })
}

pub(crate) fn current_unix_millis() -> MessengerResult<u64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| {
            MessengerError::StoreUnavailable(format!(
                "system time before unix epoch: {err}"
            ))
        })?;
    u64::try_from(duration.as_millis()).map_err(|_| {
        MessengerError::StoreUnavailable("system time out of range".to_string())
    })
}

/// Runs `sql` and maps the first row, if any.
pub(crate) fn query_optional<T, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    mapper: impl Fn(&Row<'_>) -> MessengerResult<T>,
) -> MessengerResult<Option<T>> {
    let mut stmt = conn.prepare(sql).map_err(|err| map_db_err(&err))?;
    let mut rows = stmt.query(params).map_err(|err| map_db_err(&err))?;
    match rows.next().map_err(|err| map_db_err(&err))? {
        Some(row) => mapper(row).map(Some),
        None => Ok(None),
    }
}

/// Runs `sql` and maps every row in result order.
pub(crate) fn query_all<T, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    mapper: impl Fn(&Row<'_>) -> MessengerResult<T>,
) -> MessengerResult<Vec<T>> {
    let mut stmt = conn.prepare(sql).map_err(|err| map_db_err(&err))?;
    let mut rows = stmt.query(params).map_err(|err| map_db_err(&err))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(|err| map_db_err(&err))? {
        out.push(mapper(row)?);
    }
    Ok(out)
}

/// Reads column `idx` of `row`, mapping driver errors.
pub(crate) fn column<T: rusqlite::types::FromSql>(
    row: &Row<'_>,
    idx: usize,
) -> MessengerResult<T> {
    row.get(idx).map_err(|err| map_db_err(&err))
}
