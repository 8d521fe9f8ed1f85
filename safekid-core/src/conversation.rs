//! Restartable conversation views.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::error::MessengerResult;
use crate::moderation::{self, ConversationScope};
use crate::storage::lock_connection;
use crate::types::Message;

/// A conversation as seen by one viewer.
///
/// The query holds no snapshot. Every call to [`ConversationQuery::load`],
/// [`ConversationQuery::messages`] or [`ConversationQuery::transcript`]
/// reads the store again, so a message approved after the query was created
/// shows up on the next pass.
#[derive(uniffi::Object)]
pub struct ConversationQuery {
    conn: Arc<Mutex<Connection>>,
    scope: ConversationScope,
    include_hidden: bool,
}

impl std::fmt::Debug for ConversationQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationQuery")
            .field("scope", &self.scope)
            .field("include_hidden", &self.include_hidden)
            .finish_non_exhaustive()
    }
}

impl ConversationQuery {
    pub(crate) const fn new(
        conn: Arc<Mutex<Connection>>,
        scope: ConversationScope,
        include_hidden: bool,
    ) -> Self {
        Self {
            conn,
            scope,
            include_hidden,
        }
    }

    /// Starts a fresh pass over the conversation, oldest message first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn load(&self) -> MessengerResult<impl Iterator<Item = Message>> {
        let messages = moderation::conversation(
            &*lock_connection(&self.conn)?,
            self.scope,
            self.include_hidden,
        )?;
        Ok(messages.into_iter())
    }
}

#[uniffi::export]
impl ConversationQuery {
    /// Returns the messages currently in the conversation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn messages(&self) -> MessengerResult<Vec<Message>> {
        Ok(self.load()?.collect())
    }

    /// Returns one display line per message, e.g. `bob: hi`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn transcript(&self) -> MessengerResult<Vec<String>> {
        Ok(self.messages()?.iter().map(Message::display_line).collect())
    }
}
