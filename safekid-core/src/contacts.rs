//! Contact graph: directed, approval-gated links owned by children.

use rusqlite::{params, Connection, Row};

use crate::decisions;
use crate::directory::{self, map_account};
use crate::error::{MessengerError, MessengerResult};
use crate::storage::helpers::{
    column, is_unique_violation, map_db_err, parse_column, query_all, query_optional,
    to_i64, to_u64,
};
use crate::types::{
    Account, AccountId, ContactLink, ContactLinkId, ContactState, DecisionOutcome,
    DecisionSubject,
};

const LINK_SELECT: &str = "SELECT l.id, l.owner_id, o.username, l.target_id, t.username, l.state
     FROM contact_links l
     JOIN accounts o ON o.id = l.owner_id
     JOIN accounts t ON t.id = l.target_id";

fn map_link(row: &Row<'_>) -> MessengerResult<ContactLink> {
    let state: String = column(row, 5)?;
    Ok(ContactLink {
        id: to_u64(column(row, 0)?, "link id")?,
        owner_id: to_u64(column(row, 1)?, "owner id")?,
        owner_username: column(row, 2)?,
        target_id: to_u64(column(row, 3)?, "target id")?,
        target_username: column(row, 4)?,
        state: parse_column(&state, "contact state")?,
    })
}

/// Creates a pending link from `child` to `target_username`.
pub(crate) fn request_contact(
    conn: &Connection,
    child: &Account,
    target_username: &str,
) -> MessengerResult<ContactLink> {
    let target = directory::find_by_username(conn, target_username)?
        .ok_or(MessengerError::UnknownTarget)?;
    if target.id == child.id {
        return Err(MessengerError::Forbidden);
    }
    if find_between(conn, child.id, target.id)?.is_some() {
        return Err(MessengerError::DuplicateLink);
    }
    conn.execute(
        "INSERT INTO contact_links (owner_id, target_id, state) VALUES (?1, ?2, ?3)",
        params![
            to_i64(child.id, "owner id")?,
            to_i64(target.id, "target id")?,
            ContactState::Pending.to_string(),
        ],
    )
    .map_err(|err| {
        if is_unique_violation(&err) {
            MessengerError::DuplicateLink
        } else {
            map_db_err(&err)
        }
    })?;
    Ok(ContactLink {
        id: to_u64(conn.last_insert_rowid(), "link id")?,
        owner_id: child.id,
        owner_username: child.username.clone(),
        target_id: target.id,
        target_username: target.username,
        state: ContactState::Pending,
    })
}

/// Accounts `child_id` may message, ordered by username.
pub(crate) fn list_approved_contacts_of(
    conn: &Connection,
    child_id: AccountId,
) -> MessengerResult<Vec<Account>> {
    query_all(
        conn,
        "SELECT a.id, a.username, a.role, a.guardian_id
         FROM contact_links l
         JOIN accounts a ON a.id = l.target_id
         WHERE l.owner_id = ?1 AND l.state = ?2
         ORDER BY a.username",
        params![
            to_i64(child_id, "child id")?,
            ContactState::Approved.to_string()
        ],
        map_account,
    )
}

/// Every link owned by `child_id`, in request order.
pub(crate) fn list_links_of(
    conn: &Connection,
    child_id: AccountId,
) -> MessengerResult<Vec<ContactLink>> {
    query_all(
        conn,
        &format!("{LINK_SELECT} WHERE l.owner_id = ?1 ORDER BY l.id"),
        params![to_i64(child_id, "child id")?],
        map_link,
    )
}

/// Pending requests from the children of `parent_id`, in request order.
pub(crate) fn list_pending_requests_for(
    conn: &Connection,
    parent_id: AccountId,
) -> MessengerResult<Vec<ContactLink>> {
    query_all(
        conn,
        &format!("{LINK_SELECT} WHERE o.guardian_id = ?1 AND l.state = ?2 ORDER BY l.id"),
        params![
            to_i64(parent_id, "parent id")?,
            ContactState::Pending.to_string()
        ],
        map_link,
    )
}

pub(crate) fn find_link(
    conn: &Connection,
    link_id: ContactLinkId,
) -> MessengerResult<Option<ContactLink>> {
    query_optional(
        conn,
        &format!("{LINK_SELECT} WHERE l.id = ?1"),
        params![to_i64(link_id, "link id")?],
        map_link,
    )
}

fn find_between(
    conn: &Connection,
    owner_id: AccountId,
    target_id: AccountId,
) -> MessengerResult<Option<ContactLink>> {
    query_optional(
        conn,
        &format!("{LINK_SELECT} WHERE l.owner_id = ?1 AND l.target_id = ?2"),
        params![
            to_i64(owner_id, "owner id")?,
            to_i64(target_id, "target id")?
        ],
        map_link,
    )
}

/// Loads `link_id` and checks that `guardian` supervises its owner.
pub(crate) fn ensure_decider(
    conn: &Connection,
    guardian: &Account,
    link_id: ContactLinkId,
) -> MessengerResult<ContactLink> {
    let link = find_link(conn, link_id)?.ok_or(MessengerError::UnknownContactLink)?;
    let owner = directory::find_by_id(conn, link.owner_id)?
        .ok_or(MessengerError::UnknownContactLink)?;
    if guardian.is_guardian_of(&owner) {
        Ok(link)
    } else {
        Err(MessengerError::NotGuardian)
    }
}

/// Grants or denies `link_id`. A link can be re-decided either way.
pub(crate) fn decide(
    conn: &Connection,
    guardian: &Account,
    link_id: ContactLinkId,
    grant: bool,
    now: u64,
) -> MessengerResult<ContactLink> {
    let mut link = ensure_decider(conn, guardian, link_id)?;
    let outcome = DecisionOutcome::from_grant(grant);
    let state = if grant {
        ContactState::Approved
    } else {
        ContactState::Rejected
    };
    conn.execute(
        "UPDATE contact_links SET state = ?1 WHERE id = ?2",
        params![state.to_string(), to_i64(link_id, "link id")?],
    )
    .map_err(|err| map_db_err(&err))?;
    decisions::record(
        conn,
        DecisionSubject::Contact { link_id },
        guardian.id,
        outcome,
        now,
    )?;
    if link.state != ContactState::Pending {
        log::info!("contact link {link_id} re-decided from {} to {state}", link.state);
    }
    link.state = state;
    Ok(link)
}

/// Returns whether `child_id` holds an approved link to `target_id`.
pub(crate) fn is_approved(
    conn: &Connection,
    child_id: AccountId,
    target_id: AccountId,
) -> MessengerResult<bool> {
    Ok(find_between(conn, child_id, target_id)?
        .is_some_and(|link| link.state == ContactState::Approved))
}
