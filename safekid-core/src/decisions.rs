//! Append-only log of parental decisions.

use rusqlite::{params, Connection, Row};

use crate::error::MessengerResult;
use crate::storage::helpers::{column, map_db_err, parse_column, query_all, to_i64, to_u64};
use crate::types::{AccountId, Decision, DecisionOutcome, DecisionSubject};

/// Appends a decision. Callers run this inside the deciding transaction.
pub(crate) fn record(
    conn: &Connection,
    subject: DecisionSubject,
    guardian_id: AccountId,
    outcome: DecisionOutcome,
    decided_at: u64,
) -> MessengerResult<Decision> {
    conn.execute(
        "INSERT INTO decisions (subject_kind, subject_id, guardian_id, outcome, decided_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            subject.kind(),
            to_i64(subject.subject_id(), "subject id")?,
            to_i64(guardian_id, "guardian id")?,
            outcome.to_string(),
            to_i64(decided_at, "decided_at")?,
        ],
    )
    .map_err(|err| map_db_err(&err))?;
    Ok(Decision {
        id: to_u64(conn.last_insert_rowid(), "decision id")?,
        subject,
        guardian_id,
        outcome,
        decided_at,
    })
}

/// Returns every decision about `subject`, oldest first.
pub(crate) fn history(
    conn: &Connection,
    subject: DecisionSubject,
) -> MessengerResult<Vec<Decision>> {
    query_all(
        conn,
        "SELECT id, guardian_id, outcome, decided_at FROM decisions
         WHERE subject_kind = ?1 AND subject_id = ?2
         ORDER BY id",
        params![subject.kind(), to_i64(subject.subject_id(), "subject id")?],
        |row| map_decision(row, subject),
    )
}

fn map_decision(row: &Row<'_>, subject: DecisionSubject) -> MessengerResult<Decision> {
    let outcome: String = column(row, 2)?;
    Ok(Decision {
        id: to_u64(column(row, 0)?, "decision id")?,
        subject,
        guardian_id: to_u64(column(row, 1)?, "guardian id")?,
        outcome: parse_column(&outcome, "decision outcome")?,
        decided_at: to_u64(column(row, 3)?, "decided_at")?,
    })
}
