//! Account directory: registration, authentication and guardianship lookups.

use rusqlite::{params, Connection, Row};

use crate::credentials::{hash_password, verify_password};
use crate::defaults::MessengerConfig;
use crate::error::{MessengerError, MessengerResult};
use crate::storage::helpers::{
    column, is_unique_violation, map_db_err, parse_column, query_all, query_optional,
    to_i64, to_u64,
};
use crate::types::{Account, AccountId, NewAccountRole, Role};

const ACCOUNT_COLUMNS: &str = "id, username, role, guardian_id";

pub(crate) fn map_account(row: &Row<'_>) -> MessengerResult<Account> {
    let role: String = column(row, 2)?;
    let guardian_id: Option<i64> = column(row, 3)?;
    Ok(Account {
        id: to_u64(column(row, 0)?, "account id")?,
        username: column(row, 1)?,
        role: parse_column(&role, "role")?,
        guardian_id: guardian_id
            .map(|id| to_u64(id, "guardian id"))
            .transpose()?,
    })
}

/// Usernames are non-empty ASCII letters, digits and underscores.
pub(crate) fn validate_username(username: &str) -> MessengerResult<()> {
    let valid = !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(MessengerError::InvalidUsername)
    }
}

pub(crate) fn validate_password(
    config: &MessengerConfig,
    password: &str,
) -> MessengerResult<()> {
    let length = password.chars().count();
    if u32::try_from(length).unwrap_or(u32::MAX) >= config.min_password_length {
        Ok(())
    } else {
        Err(MessengerError::WeakPassword {
            min_length: config.min_password_length,
        })
    }
}

/// Registers a parent, or a child supervised by an existing parent.
pub(crate) fn register(
    conn: &Connection,
    config: &MessengerConfig,
    username: &str,
    password: &str,
    role: &NewAccountRole,
) -> MessengerResult<Account> {
    validate_username(username)?;
    validate_password(config, password)?;
    match role {
        NewAccountRole::Parent => insert_account(conn, username, password, Role::Parent, None),
        NewAccountRole::Child { guardian_username } => {
            let guardian = find_by_username(conn, guardian_username)?
                .filter(Account::is_parent)
                .ok_or(MessengerError::UnknownGuardian)?;
            insert_account(conn, username, password, Role::Child, Some(guardian.id))
        }
    }
}

/// Creates a child account supervised by `guardian`.
pub(crate) fn create_child_account(
    conn: &Connection,
    config: &MessengerConfig,
    guardian: &Account,
    username: &str,
    password: &str,
) -> MessengerResult<Account> {
    if !guardian.is_parent() {
        return Err(MessengerError::Forbidden);
    }
    validate_username(username)?;
    validate_password(config, password)?;
    insert_account(conn, username, password, Role::Child, Some(guardian.id))
}

/// Checks `password` against the stored digest for `username`.
///
/// Unknown usernames and wrong passwords are indistinguishable.
pub(crate) fn authenticate(
    conn: &Connection,
    username: &str,
    password: &str,
) -> MessengerResult<Account> {
    let stored = query_optional(
        conn,
        &format!("SELECT {ACCOUNT_COLUMNS}, password_hash FROM accounts WHERE username = ?1"),
        params![username],
        |row| {
            let digest: String = column(row, 4)?;
            Ok((map_account(row)?, digest))
        },
    )?;
    match stored {
        Some((account, digest)) if verify_password(password, &digest) => Ok(account),
        _ => Err(MessengerError::InvalidCredentials),
    }
}

/// Lists the children supervised by `parent_id`, oldest first.
pub(crate) fn list_children_of(
    conn: &Connection,
    parent_id: AccountId,
) -> MessengerResult<Vec<Account>> {
    query_all(
        conn,
        &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE guardian_id = ?1 ORDER BY id"),
        params![to_i64(parent_id, "parent id")?],
        map_account,
    )
}

pub(crate) fn find_by_username(
    conn: &Connection,
    username: &str,
) -> MessengerResult<Option<Account>> {
    query_optional(
        conn,
        &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?1"),
        params![username],
        map_account,
    )
}

pub(crate) fn find_by_id(
    conn: &Connection,
    id: AccountId,
) -> MessengerResult<Option<Account>> {
    query_optional(
        conn,
        &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
        params![to_i64(id, "account id")?],
        map_account,
    )
}

fn insert_account(
    conn: &Connection,
    username: &str,
    password: &str,
    role: Role,
    guardian_id: Option<AccountId>,
) -> MessengerResult<Account> {
    if find_by_username(conn, username)?.is_some() {
        return Err(MessengerError::DuplicateUsername);
    }
    let guardian_i64 = guardian_id
        .map(|id| to_i64(id, "guardian id"))
        .transpose()?;
    conn.execute(
        "INSERT INTO accounts (username, password_hash, role, guardian_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![username, hash_password(password), role.to_string(), guardian_i64],
    )
    .map_err(|err| {
        if is_unique_violation(&err) {
            MessengerError::DuplicateUsername
        } else {
            map_db_err(&err)
        }
    })?;
    Ok(Account {
        id: to_u64(conn.last_insert_rowid(), "account id")?,
        username: username.to_string(),
        role,
        guardian_id,
    })
}
