//! Moderation and conversation state engine for SafeKid Messenger.
//!
//! Every contact relationship and every message between a child account and
//! a non-parent account passes through a parental approval gate before the
//! child can see it. [`Messenger`] is the only entry point: it authenticates
//! callers into [`Session`]s and routes each request through the access
//! guard, the contact graph, the content filter and the moderation queue,
//! all persisted in a single `SQLite` database.
//!
//! ```rust,no_run
//! use safekid_core::{Messenger, MessengerConfig, NewAccountRole};
//!
//! # fn main() -> Result<(), safekid_core::MessengerError> {
//! let messenger = Messenger::open_in_memory(MessengerConfig::default())?;
//! let alice = messenger.register("alice", "secret1".into(), &NewAccountRole::Parent)?;
//! let bob = messenger.create_child_account(&alice, "bob", "secret2".into())?;
//! assert_eq!(bob.guardian_id, Some(alice.account().id));
//! # Ok(())
//! # }
//! ```
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod credentials;

pub mod defaults;
pub use defaults::MessengerConfig;

mod error;
pub use error::*;

pub mod filter;
pub use filter::{ContentFilter, FilterOutcome};

pub mod logger;

mod messenger;
pub use messenger::Messenger;

mod conversation;
pub use conversation::ConversationQuery;

mod guard;
pub use guard::Session;

pub mod storage;

mod types;
pub use types::*;

// private modules
mod contacts;
mod decisions;
mod directory;
mod moderation;

uniffi::setup_scaffolding!("safekid_core");
