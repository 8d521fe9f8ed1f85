//! Messenger database schema management.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{MessengerError, MessengerResult};

use super::helpers::{current_unix_millis, map_db_err, to_i64};

pub(super) const MESSENGER_SCHEMA_VERSION: i64 = 1;

pub(super) fn ensure_schema(conn: &Connection) -> MessengerResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS messenger_meta (
            schema_version  INTEGER NOT NULL,
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        );",
    )
    .map_err(|err| map_db_err(&err))?;

    let existing: Option<i64> = conn
        .query_row(
            "SELECT schema_version FROM messenger_meta LIMIT 1;",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| map_db_err(&err))?;

    match existing {
        Some(version) if version == MESSENGER_SCHEMA_VERSION => ensure_tables(conn),
        Some(version) => Err(MessengerError::StoreUnavailable(format!(
            "unsupported schema version {version}"
        ))),
        None => {
            ensure_tables(conn)?;
            insert_meta(conn)
        }
    }
}

fn ensure_tables(conn: &Connection) -> MessengerResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS accounts (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            username        TEXT    NOT NULL UNIQUE,
            password_hash   TEXT    NOT NULL,
            role            TEXT    NOT NULL CHECK (role IN ('parent', 'child')),
            guardian_id     INTEGER REFERENCES accounts (id),
            CHECK ((role = 'child') = (guardian_id IS NOT NULL))
        );

        CREATE INDEX IF NOT EXISTS idx_accounts_guardian
        ON accounts (guardian_id);

        CREATE TABLE IF NOT EXISTS contact_links (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id    INTEGER NOT NULL REFERENCES accounts (id),
            target_id   INTEGER NOT NULL REFERENCES accounts (id),
            state       TEXT    NOT NULL
                        CHECK (state IN ('pending', 'approved', 'rejected')),
            UNIQUE (owner_id, target_id)
        );

        CREATE TABLE IF NOT EXISTS messages (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id           INTEGER NOT NULL REFERENCES accounts (id),
            receiver_id         INTEGER NOT NULL REFERENCES accounts (id),
            body                TEXT    NOT NULL,
            created_at          INTEGER NOT NULL,
            approval_state      TEXT    NOT NULL
                                CHECK (approval_state IN
                                    ('auto_approved', 'pending', 'approved', 'rejected')),
            visible_to_child    INTEGER NOT NULL CHECK (visible_to_child IN (0, 1))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_by_sender
        ON messages (sender_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_messages_by_receiver
        ON messages (receiver_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_messages_by_state
        ON messages (approval_state, created_at);

        CREATE TABLE IF NOT EXISTS decisions (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            subject_kind    TEXT    NOT NULL CHECK (subject_kind IN ('contact', 'message')),
            subject_id      INTEGER NOT NULL,
            guardian_id     INTEGER NOT NULL REFERENCES accounts (id),
            outcome         TEXT    NOT NULL CHECK (outcome IN ('approved', 'rejected')),
            decided_at      INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_decisions_by_subject
        ON decisions (subject_kind, subject_id, id);",
    )
    .map_err(|err| map_db_err(&err))?;
    Ok(())
}

fn insert_meta(conn: &Connection) -> MessengerResult<()> {
    let now = to_i64(current_unix_millis()?, "created_at")?;
    conn.execute(
        "INSERT INTO messenger_meta (schema_version, created_at, updated_at)
         VALUES (?1, ?2, ?2)",
        [MESSENGER_SCHEMA_VERSION, now],
    )
    .map_err(|err| map_db_err(&err))?;
    Ok(())
}
