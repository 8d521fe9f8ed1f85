use thiserror::Error;

/// Result type for messenger operations.
pub type MessengerResult<T> = Result<T, MessengerError>;

/// Error outputs from the messenger core.
///
/// Every variant is recoverable at the call site. Validation failures are
/// raised before anything is written, and a failed write rolls the whole
/// operation back.
#[derive(Debug, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum MessengerError {
    /// The requested username belongs to an existing account.
    #[error("duplicate_username: that username is already taken")]
    DuplicateUsername,
    /// The username contains characters other than letters, digits and `_`.
    #[error("invalid_username: use only letters, digits and underscores")]
    InvalidUsername,
    /// The password is shorter than the configured minimum.
    #[error("weak_password: passwords need at least {min_length} characters")]
    WeakPassword {
        /// Minimum number of characters required.
        min_length: u32,
    },
    /// The named guardian does not exist or is not a parent account.
    #[error("unknown_guardian: no parent account with that username")]
    UnknownGuardian,
    /// Username and password do not match a stored account.
    #[error("invalid_credentials: wrong username or password")]
    InvalidCredentials,
    /// The contact or conversation partner does not exist.
    #[error("unknown_target: no account with that username")]
    UnknownTarget,
    /// A contact request for this pair of accounts already exists.
    #[error("duplicate_link: a contact request for this account already exists")]
    DuplicateLink,
    /// The child has no approved contact link to the receiver.
    #[error("contact_not_approved: this contact has not been approved by a parent")]
    ContactNotApproved,
    /// The message receiver does not exist.
    #[error("unknown_receiver: no account with that username")]
    UnknownReceiver,
    /// The caller is not the guardian entitled to decide this request.
    #[error("not_guardian: only the child's guardian can decide this")]
    NotGuardian,
    /// The caller's role does not allow this operation.
    #[error("forbidden: this account cannot perform that action")]
    Forbidden,
    /// The contact link id does not exist.
    #[error("unknown_contact_link: no contact request with that id")]
    UnknownContactLink,
    /// The message id does not exist.
    #[error("unknown_message: no message with that id")]
    UnknownMessage,
    /// The message can no longer be decided (rejected or auto-approved).
    #[error("decision_closed: this message can no longer be decided")]
    DecisionClosed,
    /// The message body is empty after trimming whitespace.
    #[error("empty_message: cannot send an empty message")]
    EmptyMessage,
    /// The persistent store failed; the operation was rolled back.
    #[error("store_unavailable: {0}")]
    StoreUnavailable(String),
    /// The messenger's connection mutex was poisoned.
    #[error("lock_error: {0}")]
    Lock(String),
}
