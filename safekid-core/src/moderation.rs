//! Moderation queue: message creation, visibility and parental decisions.
//!
//! A message sent by a parent is auto-approved and visible at once. Every
//! other message starts pending and stays hidden from children until a
//! guardian of the sender or the receiver approves it. Rejection is final.

use rusqlite::{params, Connection, Row};

use crate::contacts;
use crate::decisions;
use crate::directory;
use crate::error::{MessengerError, MessengerResult};
use crate::filter::ContentFilter;
use crate::storage::helpers::{
    column, map_db_err, parse_column, query_all, query_optional, to_i64, to_u64,
};
use crate::types::{
    Account, AccountId, ApprovalState, DecisionOutcome, DecisionSubject, Message, MessageId,
    SentMessage,
};

const MESSAGE_SELECT: &str = "SELECT m.id, m.sender_id, s.username, m.receiver_id, r.username,
            m.body, m.created_at, m.approval_state, m.visible_to_child
     FROM messages m
     JOIN accounts s ON s.id = m.sender_id
     JOIN accounts r ON r.id = m.receiver_id";

/// Which messages a conversation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConversationScope {
    /// Messages exchanged between `viewer` and `other`, in either direction.
    Between {
        viewer: AccountId,
        other: AccountId,
    },
    /// Every message a child sent or received, as seen by its guardian.
    ChildThread { child: AccountId },
}

fn map_message(row: &Row<'_>) -> MessengerResult<Message> {
    let state: String = column(row, 7)?;
    Ok(Message {
        id: to_u64(column(row, 0)?, "message id")?,
        sender_id: to_u64(column(row, 1)?, "sender id")?,
        sender_username: column(row, 2)?,
        receiver_id: to_u64(column(row, 3)?, "receiver id")?,
        receiver_username: column(row, 4)?,
        body: column(row, 5)?,
        created_at: to_u64(column(row, 6)?, "created_at")?,
        approval_state: parse_column(&state, "approval state")?,
        visible_to_child: column(row, 8)?,
    })
}

/// Filters and stores a message from `sender` to `receiver_username`.
///
/// A child may message its own guardian freely; any other receiver needs an
/// approved contact link first.
pub(crate) fn send(
    conn: &Connection,
    filter: &ContentFilter,
    sender: &Account,
    receiver_username: &str,
    body: &str,
    now: u64,
) -> MessengerResult<SentMessage> {
    if body.trim().is_empty() {
        return Err(MessengerError::EmptyMessage);
    }
    let receiver = directory::find_by_username(conn, receiver_username)?
        .ok_or(MessengerError::UnknownReceiver)?;
    if sender.is_child()
        && sender.guardian_id != Some(receiver.id)
        && !contacts::is_approved(conn, sender.id, receiver.id)?
    {
        return Err(MessengerError::ContactNotApproved);
    }

    let filtered = filter.apply(body);
    let approval_state = if sender.is_parent() {
        ApprovalState::AutoApproved
    } else {
        ApprovalState::Pending
    };
    let visible_to_child = approval_state.is_visible_to_child();
    conn.execute(
        "INSERT INTO messages
            (sender_id, receiver_id, body, created_at, approval_state, visible_to_child)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            to_i64(sender.id, "sender id")?,
            to_i64(receiver.id, "receiver id")?,
            filtered.text,
            to_i64(now, "created_at")?,
            approval_state.to_string(),
            visible_to_child,
        ],
    )
    .map_err(|err| map_db_err(&err))?;

    let message = Message {
        id: to_u64(conn.last_insert_rowid(), "message id")?,
        sender_id: sender.id,
        sender_username: sender.username.clone(),
        receiver_id: receiver.id,
        receiver_username: receiver.username,
        body: filtered.text,
        created_at: now,
        approval_state,
        visible_to_child,
    };
    if filtered.was_filtered {
        log::info!(
            "message {} masked {} term occurrence(s)",
            message.id,
            filtered.masked_count
        );
    }
    Ok(SentMessage {
        message,
        was_filtered: filtered.was_filtered,
    })
}

/// Messages in `scope`, oldest first with ties broken by id.
///
/// Hidden messages (pending or rejected) are only returned when
/// `include_hidden` is set, which callers do for parent viewers.
pub(crate) fn conversation(
    conn: &Connection,
    scope: ConversationScope,
    include_hidden: bool,
) -> MessengerResult<Vec<Message>> {
    let visibility = if include_hidden {
        ""
    } else {
        " AND m.visible_to_child = 1"
    };
    match scope {
        ConversationScope::Between { viewer, other } => query_all(
            conn,
            &format!(
                "{MESSAGE_SELECT}
                 WHERE ((m.sender_id = ?1 AND m.receiver_id = ?2)
                     OR (m.sender_id = ?2 AND m.receiver_id = ?1)){visibility}
                 ORDER BY m.created_at, m.id"
            ),
            params![to_i64(viewer, "viewer id")?, to_i64(other, "other id")?],
            map_message,
        ),
        ConversationScope::ChildThread { child } => query_all(
            conn,
            &format!(
                "{MESSAGE_SELECT}
                 WHERE (m.sender_id = ?1 OR m.receiver_id = ?1){visibility}
                 ORDER BY m.created_at, m.id"
            ),
            params![to_i64(child, "child id")?],
            map_message,
        ),
    }
}

/// Pending messages a guardian of either party may decide, oldest first.
pub(crate) fn pending_for_guardian(
    conn: &Connection,
    parent_id: AccountId,
) -> MessengerResult<Vec<Message>> {
    query_all(
        conn,
        &format!(
            "{MESSAGE_SELECT}
             WHERE m.approval_state = ?1
               AND (s.guardian_id = ?2 OR r.guardian_id = ?2)
             ORDER BY m.created_at, m.id"
        ),
        params![
            ApprovalState::Pending.to_string(),
            to_i64(parent_id, "parent id")?
        ],
        map_message,
    )
}

pub(crate) fn find_message(
    conn: &Connection,
    message_id: MessageId,
) -> MessengerResult<Option<Message>> {
    query_optional(
        conn,
        &format!("{MESSAGE_SELECT} WHERE m.id = ?1"),
        params![to_i64(message_id, "message id")?],
        map_message,
    )
}

/// Loads `message_id` and checks that `guardian` supervises its sender or
/// receiver.
pub(crate) fn ensure_decider(
    conn: &Connection,
    guardian: &Account,
    message_id: MessageId,
) -> MessengerResult<Message> {
    let message = find_message(conn, message_id)?.ok_or(MessengerError::UnknownMessage)?;
    for party in [message.sender_id, message.receiver_id] {
        if let Some(account) = directory::find_by_id(conn, party)? {
            if guardian.is_guardian_of(&account) {
                return Ok(message);
            }
        }
    }
    Err(MessengerError::NotGuardian)
}

/// Approves or rejects `message_id`.
///
/// Rejected and auto-approved messages are closed. An approved message can
/// still be rejected.
pub(crate) fn decide(
    conn: &Connection,
    guardian: &Account,
    message_id: MessageId,
    approve: bool,
    now: u64,
) -> MessengerResult<Message> {
    let mut message = ensure_decider(conn, guardian, message_id)?;
    match message.approval_state {
        ApprovalState::Rejected | ApprovalState::AutoApproved => {
            log::warn!(
                "refusing decision on {} message {message_id}",
                message.approval_state
            );
            return Err(MessengerError::DecisionClosed);
        }
        ApprovalState::Approved if approve => {
            log::debug!("message {message_id} approved again");
        }
        ApprovalState::Approved | ApprovalState::Pending => {}
    }

    let state = if approve {
        ApprovalState::Approved
    } else {
        ApprovalState::Rejected
    };
    conn.execute(
        "UPDATE messages SET approval_state = ?1, visible_to_child = ?2 WHERE id = ?3",
        params![
            state.to_string(),
            approve,
            to_i64(message_id, "message id")?
        ],
    )
    .map_err(|err| map_db_err(&err))?;
    decisions::record(
        conn,
        DecisionSubject::Message { message_id },
        guardian.id,
        DecisionOutcome::from_grant(approve),
        now,
    )?;
    message.approval_state = state;
    message.visible_to_child = approve;
    Ok(message)
}
