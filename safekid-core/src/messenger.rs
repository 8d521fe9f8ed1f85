//! The messenger facade exported to host applications.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use zeroize::Zeroizing;

use crate::conversation::ConversationQuery;
use crate::defaults::MessengerConfig;
use crate::error::{MessengerError, MessengerResult};
use crate::filter::{ContentFilter, FilterOutcome};
use crate::guard::{require_guardian_of, require_issued_by, require_role, Session};
use crate::moderation::ConversationScope;
use crate::storage::helpers::{current_unix_millis, map_db_err};
use crate::storage::{
    begin_immediate, lock_connection, open_database, open_in_memory_database, StoragePaths,
};
use crate::types::{
    Account, ContactLink, ContactLinkId, Decision, DecisionSubject, Message, MessageId,
    NewAccountRole, Role, SentMessage,
};
use crate::{contacts, decisions, directory, moderation};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Supervised messaging between parent and child accounts.
///
/// Every operation except registration and authentication takes the
/// caller's [`Session`]. Writes run in a single `BEGIN IMMEDIATE`
/// transaction and either commit fully or leave the store untouched.
/// Sessions minted by one messenger are refused by every other.
#[derive(uniffi::Object)]
pub struct Messenger {
    instance: u64,
    conn: Arc<Mutex<Connection>>,
    config: MessengerConfig,
    filter: Arc<ContentFilter>,
}

impl std::fmt::Debug for Messenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messenger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Messenger {
    fn from_connection(conn: Connection, config: MessengerConfig) -> Self {
        let filter = Arc::new(ContentFilter::from_config(&config));
        Self {
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            conn: Arc::new(Mutex::new(conn)),
            config,
            filter,
        }
    }

    fn read<T>(
        &self,
        op: impl FnOnce(&Connection) -> MessengerResult<T>,
    ) -> MessengerResult<T> {
        let conn = lock_connection(&self.conn)?;
        op(&conn)
    }

    fn write<T>(
        &self,
        op: impl FnOnce(&Connection) -> MessengerResult<T>,
    ) -> MessengerResult<T> {
        let mut conn = lock_connection(&self.conn)?;
        let tx = begin_immediate(&mut conn)?;
        let value = op(&tx)?;
        tx.commit().map_err(|err| map_db_err(&err))?;
        Ok(value)
    }

    fn lookup(&self, username: &str, missing: MessengerError) -> MessengerResult<Account> {
        self.read(|conn| directory::find_by_username(conn, username))?
            .ok_or(missing)
    }
}

#[uniffi::export]
impl Messenger {
    /// Opens the messenger database under `paths`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::StoreUnavailable`] if the database cannot be
    /// created, fails its integrity check or has an unknown schema version.
    #[uniffi::constructor]
    pub fn open(paths: &StoragePaths, config: MessengerConfig) -> MessengerResult<Self> {
        let conn = open_database(paths)?;
        log::info!("messenger opened at {}", paths.database_path().display());
        Ok(Self::from_connection(conn, config))
    }

    /// Opens a messenger backed by a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::StoreUnavailable`] if `SQLite` fails to start.
    #[uniffi::constructor]
    pub fn open_in_memory(config: MessengerConfig) -> MessengerResult<Self> {
        let conn = open_in_memory_database()?;
        Ok(Self::from_connection(conn, config))
    }

    /// Returns the configuration this messenger was opened with.
    #[must_use]
    pub fn config(&self) -> MessengerConfig {
        self.config.clone()
    }

    /// Registers a new account and signs it in.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsername`, `WeakPassword`, `UnknownGuardian` or
    /// `DuplicateUsername` before anything is written.
    pub fn register(
        &self,
        username: &str,
        password: String,
        role: &NewAccountRole,
    ) -> MessengerResult<Arc<Session>> {
        let password = Zeroizing::new(password);
        let account = self.write(|conn| {
            directory::register(conn, &self.config, username, &password, role)
        })?;
        log::info!("registered {} account {}", account.role, account.username);
        Ok(Arc::new(Session::new(account, self.instance)))
    }

    /// Signs in with a username and password.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidCredentials` for an unknown username or a wrong
    /// password.
    pub fn authenticate(
        &self,
        username: &str,
        password: String,
    ) -> MessengerResult<Arc<Session>> {
        let password = Zeroizing::new(password);
        let result = self.read(|conn| directory::authenticate(conn, username, &password));
        match result {
            Ok(account) => {
                log::debug!("authenticated {}", account.username);
                Ok(Arc::new(Session::new(account, self.instance)))
            }
            Err(err) => {
                log::warn!("failed sign-in for {username}");
                Err(err)
            }
        }
    }

    /// Creates a child account supervised by the calling parent.
    ///
    /// # Errors
    ///
    /// Fails with `Forbidden` unless the caller is a parent, then with the
    /// same validation errors as [`Messenger::register`].
    pub fn create_child_account(
        &self,
        session: &Session,
        username: &str,
        password: String,
    ) -> MessengerResult<Account> {
        require_issued_by(session, self.instance)?;
        require_role(session, Role::Parent)?;
        let password = Zeroizing::new(password);
        let child = self.write(|conn| {
            directory::create_child_account(
                conn,
                &self.config,
                session.account(),
                username,
                &password,
            )
        })?;
        log::info!(
            "{} created child account {}",
            session.account().username,
            child.username
        );
        Ok(child)
    }

    /// Lists the calling parent's children, oldest first.
    ///
    /// # Errors
    ///
    /// Fails with `Forbidden` unless the caller is a parent.
    pub fn list_children(&self, session: &Session) -> MessengerResult<Vec<Account>> {
        require_issued_by(session, self.instance)?;
        require_role(session, Role::Parent)?;
        self.read(|conn| directory::list_children_of(conn, session.account().id))
    }

    /// Asks the calling child's guardian to approve `target_username`.
    ///
    /// # Errors
    ///
    /// Fails with `Forbidden` unless the caller is a child (or when a child
    /// names itself), `UnknownTarget` or `DuplicateLink`.
    pub fn request_contact(
        &self,
        session: &Session,
        target_username: &str,
    ) -> MessengerResult<ContactLink> {
        require_issued_by(session, self.instance)?;
        require_role(session, Role::Child)?;
        let link = self.write(|conn| {
            contacts::request_contact(conn, session.account(), target_username)
        })?;
        log::info!(
            "{} requested contact {} (link {})",
            link.owner_username,
            link.target_username,
            link.id
        );
        Ok(link)
    }

    /// Accounts the calling child may message, ordered by username.
    ///
    /// # Errors
    ///
    /// Fails with `Forbidden` unless the caller is a child.
    pub fn approved_contacts(&self, session: &Session) -> MessengerResult<Vec<Account>> {
        require_issued_by(session, self.instance)?;
        require_role(session, Role::Child)?;
        self.read(|conn| contacts::list_approved_contacts_of(conn, session.account().id))
    }

    /// Every contact link of the calling child, including pending and
    /// rejected ones.
    ///
    /// # Errors
    ///
    /// Fails with `Forbidden` unless the caller is a child.
    pub fn contact_links(&self, session: &Session) -> MessengerResult<Vec<ContactLink>> {
        require_issued_by(session, self.instance)?;
        require_role(session, Role::Child)?;
        self.read(|conn| contacts::list_links_of(conn, session.account().id))
    }

    /// Pending contact requests from the calling parent's children.
    ///
    /// # Errors
    ///
    /// Fails with `Forbidden` unless the caller is a parent.
    pub fn pending_contact_requests(
        &self,
        session: &Session,
    ) -> MessengerResult<Vec<ContactLink>> {
        require_issued_by(session, self.instance)?;
        require_role(session, Role::Parent)?;
        self.read(|conn| contacts::list_pending_requests_for(conn, session.account().id))
    }

    /// Grants or denies a contact request. Links may be re-decided.
    ///
    /// # Errors
    ///
    /// Fails with `Forbidden` unless the caller is a parent,
    /// `UnknownContactLink`, or `NotGuardian` when the caller does not
    /// supervise the requesting child.
    pub fn decide_contact(
        &self,
        session: &Session,
        link_id: ContactLinkId,
        grant: bool,
    ) -> MessengerResult<ContactLink> {
        require_issued_by(session, self.instance)?;
        require_role(session, Role::Parent)?;
        let now = current_unix_millis()?;
        let link = self
            .write(|conn| contacts::decide(conn, session.account(), link_id, grant, now))?;
        log::info!(
            "{} set contact link {} to {}",
            session.account().username,
            link.id,
            link.state
        );
        Ok(link)
    }

    /// Returns whether the calling child may message `target_username`.
    ///
    /// # Errors
    ///
    /// Fails with `Forbidden` unless the caller is a child, or
    /// `UnknownTarget`.
    pub fn is_contact_approved(
        &self,
        session: &Session,
        target_username: &str,
    ) -> MessengerResult<bool> {
        require_issued_by(session, self.instance)?;
        require_role(session, Role::Child)?;
        let target = self.lookup(target_username, MessengerError::UnknownTarget)?;
        self.read(|conn| contacts::is_approved(conn, session.account().id, target.id))
    }

    /// Filters and sends a message.
    ///
    /// Parent messages are visible at once. Child messages wait for a
    /// guardian's approval.
    ///
    /// # Errors
    ///
    /// Fails with `EmptyMessage`, `UnknownReceiver` or
    /// `ContactNotApproved`; nothing is stored on failure.
    pub fn send_message(
        &self,
        session: &Session,
        receiver_username: &str,
        body: &str,
    ) -> MessengerResult<SentMessage> {
        require_issued_by(session, self.instance)?;
        let now = current_unix_millis()?;
        let sent = self.write(|conn| {
            moderation::send(
                conn,
                &self.filter,
                session.account(),
                receiver_username,
                body,
                now,
            )
        })?;
        log::debug!(
            "message {} from {} to {} is {}",
            sent.message.id,
            sent.message.sender_username,
            sent.message.receiver_username,
            sent.message.approval_state
        );
        Ok(sent)
    }

    /// The conversation between the caller and `other_username`.
    ///
    /// Children only see approved and auto-approved messages. Parents also
    /// see pending and rejected ones.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownTarget` if `other_username` does not exist.
    pub fn conversation(
        &self,
        session: &Session,
        other_username: &str,
    ) -> MessengerResult<Arc<ConversationQuery>> {
        require_issued_by(session, self.instance)?;
        let other = self.lookup(other_username, MessengerError::UnknownTarget)?;
        let scope = ConversationScope::Between {
            viewer: session.account().id,
            other: other.id,
        };
        Ok(Arc::new(ConversationQuery::new(
            Arc::clone(&self.conn),
            scope,
            session.account().is_parent(),
        )))
    }

    /// Every message a child sent or received, for its guardian.
    ///
    /// # Errors
    ///
    /// Fails with `Forbidden` unless the caller is a parent supervising
    /// `child_username`, or `UnknownTarget`.
    pub fn child_thread(
        &self,
        session: &Session,
        child_username: &str,
    ) -> MessengerResult<Arc<ConversationQuery>> {
        require_issued_by(session, self.instance)?;
        require_role(session, Role::Parent)?;
        let child = self.lookup(child_username, MessengerError::UnknownTarget)?;
        require_guardian_of(session, &child)?;
        Ok(Arc::new(ConversationQuery::new(
            Arc::clone(&self.conn),
            ConversationScope::ChildThread { child: child.id },
            true,
        )))
    }

    /// Pending messages the calling parent may decide, oldest first.
    ///
    /// # Errors
    ///
    /// Fails with `Forbidden` unless the caller is a parent.
    pub fn pending_messages(&self, session: &Session) -> MessengerResult<Vec<Message>> {
        require_issued_by(session, self.instance)?;
        require_role(session, Role::Parent)?;
        self.read(|conn| moderation::pending_for_guardian(conn, session.account().id))
    }

    /// Approves or rejects a pending message.
    ///
    /// # Errors
    ///
    /// Fails with `Forbidden` unless the caller is a parent,
    /// `UnknownMessage`, `NotGuardian`, or `DecisionClosed` for rejected and
    /// auto-approved messages.
    pub fn decide_message(
        &self,
        session: &Session,
        message_id: MessageId,
        approve: bool,
    ) -> MessengerResult<Message> {
        require_issued_by(session, self.instance)?;
        require_role(session, Role::Parent)?;
        let now = current_unix_millis()?;
        let message = self.write(|conn| {
            moderation::decide(conn, session.account(), message_id, approve, now)
        })?;
        log::info!(
            "{} set message {} to {}",
            session.account().username,
            message.id,
            message.approval_state
        );
        Ok(message)
    }

    /// Every decision made on a contact link or message, oldest first.
    ///
    /// # Errors
    ///
    /// Fails with `Forbidden` unless the caller is a parent, with
    /// `UnknownContactLink`/`UnknownMessage`, or `NotGuardian` when the
    /// caller could not decide that subject.
    pub fn decision_history(
        &self,
        session: &Session,
        subject: DecisionSubject,
    ) -> MessengerResult<Vec<Decision>> {
        require_issued_by(session, self.instance)?;
        require_role(session, Role::Parent)?;
        self.read(|conn| {
            match subject {
                DecisionSubject::Contact { link_id } => {
                    contacts::ensure_decider(conn, session.account(), link_id)?;
                }
                DecisionSubject::Message { message_id } => {
                    moderation::ensure_decider(conn, session.account(), message_id)?;
                }
            }
            decisions::history(conn, subject)
        })
    }

    /// The content filter applied to outgoing messages.
    #[must_use]
    pub fn content_filter(&self) -> Arc<ContentFilter> {
        Arc::clone(&self.filter)
    }

    /// Runs `text` through the content filter without sending anything.
    #[must_use]
    pub fn preview_filter(&self, text: &str) -> FilterOutcome {
        self.filter.apply(text)
    }
}
