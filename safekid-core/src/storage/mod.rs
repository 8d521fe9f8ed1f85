//! Persistent storage for the messenger.
//!
//! All components share one `SQLite` database. Each multi-step operation runs
//! inside a single `BEGIN IMMEDIATE` transaction obtained from
//! [`begin_immediate`]; dropping the transaction without committing rolls it
//! back.

pub(crate) mod helpers;
pub mod paths;
mod schema;

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};

use crate::error::{MessengerError, MessengerResult};
use helpers::{map_db_err, map_io_err};
pub use paths::StoragePaths;

/// Opens (creating if needed) the messenger database under `paths`.
pub(crate) fn open_database(paths: &StoragePaths) -> MessengerResult<Connection> {
    fs::create_dir_all(paths.safekid_dir()).map_err(|err| map_io_err(&err))?;
    let path = paths.database_path();
    log::debug!("opening messenger database at {}", path.display());
    let conn = open_connection(&path).map_err(|err| map_db_err(&err))?;
    prepare(conn)
}

/// Opens a fresh private in-memory database.
pub(crate) fn open_in_memory_database() -> MessengerResult<Connection> {
    let conn = Connection::open_in_memory().map_err(|err| map_db_err(&err))?;
    prepare(conn)
}

/// Starts a write transaction that takes the database write lock up front.
pub(crate) fn begin_immediate(conn: &mut Connection) -> MessengerResult<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| map_db_err(&err))
}

/// Locks the shared connection, mapping poison to [`MessengerError::Lock`].
pub(crate) fn lock_connection(
    conn: &Mutex<Connection>,
) -> MessengerResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|err| MessengerError::Lock(format!("connection mutex poisoned: {err}")))
}

fn open_connection(path: &Path) -> rusqlite::Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    Connection::open_with_flags(path, flags)
}

fn prepare(conn: Connection) -> MessengerResult<Connection> {
    configure_connection(&conn).map_err(|err| map_db_err(&err))?;
    schema::ensure_schema(&conn)?;
    if !integrity_check(&conn).map_err(|err| map_db_err(&err))? {
        return Err(MessengerError::StoreUnavailable(
            "integrity_check failed".to_string(),
        ));
    }
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA synchronous = FULL;",
    )?;
    // In-memory databases report `memory` here; both are accepted.
    let mode: String =
        conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    log::debug!("journal_mode = {mode}");
    Ok(())
}

fn integrity_check(conn: &Connection) -> rusqlite::Result<bool> {
    let result: String =
        conn.query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;
    Ok(result.trim() == "ok")
}
