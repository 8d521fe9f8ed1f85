//! Caller sessions and the access checks applied before every request.

use crate::error::{MessengerError, MessengerResult};
use crate::types::{Account, Role};

/// An authenticated caller.
///
/// Sessions are only minted by [`crate::Messenger`] after registration or a
/// successful password check, and every operation takes the session of the
/// caller explicitly. There is no ambient "current user".
///
/// A session is bound to the messenger instance that minted it. Account ids
/// are only unique within one store, so another instance refuses it.
#[derive(Debug, uniffi::Object)]
pub struct Session {
    account: Account,
    issuer: u64,
}

impl Session {
    pub(crate) const fn new(account: Account, issuer: u64) -> Self {
        Self { account, issuer }
    }

    /// Returns the authenticated account.
    #[must_use]
    pub const fn account(&self) -> &Account {
        &self.account
    }
}

#[uniffi::export]
impl Session {
    /// Returns a copy of the authenticated account.
    #[must_use]
    pub fn caller(&self) -> Account {
        self.account.clone()
    }

    /// Returns the caller's username.
    #[must_use]
    pub fn username(&self) -> String {
        self.account.username.clone()
    }

    /// Returns the caller's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.account.role
    }
}

/// Fails with [`MessengerError::Forbidden`] unless the session was minted by
/// the messenger instance `issuer`.
pub(crate) fn require_issued_by(caller: &Session, issuer: u64) -> MessengerResult<()> {
    if caller.issuer == issuer {
        Ok(())
    } else {
        log::warn!(
            "denied {}: session belongs to another messenger",
            caller.account.username
        );
        Err(MessengerError::Forbidden)
    }
}

/// Fails with [`MessengerError::Forbidden`] unless the caller has `role`.
pub(crate) fn require_role(caller: &Session, role: Role) -> MessengerResult<()> {
    if caller.account.role == role {
        Ok(())
    } else {
        log::debug!(
            "denied {} caller {}: requires {role}",
            caller.account.role,
            caller.account.username
        );
        Err(MessengerError::Forbidden)
    }
}

/// Fails with [`MessengerError::Forbidden`] unless the caller is `child`'s guardian.
pub(crate) fn require_guardian_of(caller: &Session, child: &Account) -> MessengerResult<()> {
    if caller.account.is_guardian_of(child) {
        Ok(())
    } else {
        log::debug!(
            "denied {}: not the guardian of {}",
            caller.account.username,
            child.username
        );
        Err(MessengerError::Forbidden)
    }
}
