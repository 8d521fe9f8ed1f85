//! Records shared by the account directory, contact graph and moderation queue.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a stored account.
pub type AccountId = u64;

/// Identifier of a stored contact link.
pub type ContactLinkId = u64;

/// Identifier of a stored message.
pub type MessageId = u64;

/// Identifier of a logged parental decision.
pub type DecisionId = u64;

/// Role of an account. Stored as its snake case name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
    uniffi::Enum,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Guardian account. Self-registers and never has a guardian.
    Parent,
    /// Supervised account. Always has exactly one parent guardian.
    Child,
}

/// Role requested when registering a new account.
///
/// A child registration names its guardian; a parent registration cannot
/// carry one.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum NewAccountRole {
    /// Register a parent account.
    Parent,
    /// Register a child account supervised by an existing parent.
    Child {
        /// Username of the parent who becomes the guardian.
        guardian_username: String,
    },
}

/// Approval state of a contact link.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
    uniffi::Enum,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContactState {
    /// Requested by the child, waiting for the guardian.
    Pending,
    /// Granted by the guardian.
    Approved,
    /// Denied by the guardian.
    Rejected,
}

/// Approval state of a message.
///
/// `AutoApproved` is only ever assigned at creation to messages sent by a
/// parent; it is never entered from `Pending`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
    uniffi::Enum,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    /// Sent by a parent; visible immediately.
    AutoApproved,
    /// Waiting for a guardian of the sender or receiver.
    Pending,
    /// Approved by a guardian.
    Approved,
    /// Rejected by a guardian. Permanently hidden from children.
    Rejected,
}

impl ApprovalState {
    /// Returns whether a message in this state may be shown to a child.
    #[must_use]
    pub const fn is_visible_to_child(self) -> bool {
        matches!(self, Self::AutoApproved | Self::Approved)
    }
}

/// Outcome recorded for a parental decision.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
    uniffi::Enum,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// The request was granted.
    Approved,
    /// The request was denied.
    Rejected,
}

impl DecisionOutcome {
    /// Maps a grant/deny flag to an outcome.
    #[must_use]
    pub const fn from_grant(grant: bool) -> Self {
        if grant {
            Self::Approved
        } else {
            Self::Rejected
        }
    }
}

/// Entity a parental decision applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum DecisionSubject {
    /// A child's contact request.
    Contact {
        /// Contact link being decided.
        link_id: ContactLinkId,
    },
    /// A pending message.
    Message {
        /// Message being decided.
        message_id: MessageId,
    },
}

impl DecisionSubject {
    pub(crate) const fn kind(self) -> &'static str {
        match self {
            Self::Contact { .. } => "contact",
            Self::Message { .. } => "message",
        }
    }

    pub(crate) const fn subject_id(self) -> u64 {
        match self {
            Self::Contact { link_id } => link_id,
            Self::Message { message_id } => message_id,
        }
    }
}

/// A stored account. The password digest never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct Account {
    /// Unique, immutable identifier.
    pub id: AccountId,
    /// Unique, immutable username.
    pub username: String,
    /// Parent or child.
    pub role: Role,
    /// Guardian of a child account; `None` for parents.
    pub guardian_id: Option<AccountId>,
}

impl Account {
    /// Returns whether this is a parent account.
    #[must_use]
    pub fn is_parent(&self) -> bool {
        self.role == Role::Parent
    }

    /// Returns whether this is a child account.
    #[must_use]
    pub fn is_child(&self) -> bool {
        self.role == Role::Child
    }

    /// Returns whether this account is the guardian of `other`.
    #[must_use]
    pub fn is_guardian_of(&self, other: &Self) -> bool {
        self.is_parent() && other.guardian_id == Some(self.id)
    }
}

/// A directed, approval-gated contact relationship owned by a child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct ContactLink {
    /// Unique identifier.
    pub id: ContactLinkId,
    /// Child who requested the contact.
    pub owner_id: AccountId,
    /// Username of the requesting child.
    pub owner_username: String,
    /// Account the child wants to talk to.
    pub target_id: AccountId,
    /// Username of the requested contact.
    pub target_username: String,
    /// Current approval state.
    pub state: ContactState,
}

/// A stored message together with its moderation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct Message {
    /// Unique identifier.
    pub id: MessageId,
    /// Sending account.
    pub sender_id: AccountId,
    /// Username of the sender.
    pub sender_username: String,
    /// Receiving account.
    pub receiver_id: AccountId,
    /// Username of the receiver.
    pub receiver_username: String,
    /// Body after content filtering.
    pub body: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Current moderation state.
    pub approval_state: ApprovalState,
    /// Whether a child may see this message.
    pub visible_to_child: bool,
}

impl Message {
    /// Formats the message as a transcript line, e.g. `bob: hi`.
    ///
    /// Messages a child cannot see carry their state as a suffix, e.g.
    /// `bob: hi [rejected]`.
    #[must_use]
    pub fn display_line(&self) -> String {
        if self.visible_to_child {
            format!("{}: {}", self.sender_username, self.body)
        } else {
            format!(
                "{}: {} [{}]",
                self.sender_username, self.body, self.approval_state
            )
        }
    }
}

/// Result of sending a message.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SentMessage {
    /// The stored message.
    pub message: Message,
    /// Whether the content filter masked part of the body.
    pub was_filtered: bool,
}

/// A logged parental decision.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct Decision {
    /// Unique identifier, increasing in decision order.
    pub id: DecisionId,
    /// Contact link or message the decision applies to.
    pub subject: DecisionSubject,
    /// Guardian who decided.
    pub guardian_id: AccountId,
    /// Granted or denied.
    pub outcome: DecisionOutcome,
    /// Decision time in milliseconds since the Unix epoch.
    pub decided_at: u64,
}
