//! Common test utilities shared across integration tests.

use std::sync::Arc;

use safekid_core::{Messenger, MessengerConfig, NewAccountRole, Session};
use tempfile::TempDir;

/// Routes `log` records to the test writer, filtered by `RUST_LOG`.
#[allow(dead_code, reason = "used in tests")]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Fresh temporary directory removed when dropped.
#[allow(dead_code, reason = "used in tests")]
pub fn temp_root() -> TempDir {
    tempfile::Builder::new()
        .prefix("safekid-test-")
        .tempdir()
        .expect("create temp root")
}

/// Messenger on a private in-memory store with the default config.
#[allow(dead_code, reason = "used in tests")]
pub fn in_memory_messenger() -> Messenger {
    init_logging();
    Messenger::open_in_memory(MessengerConfig::default()).expect("open messenger")
}

/// alice (parent) supervises bob (child); carol is an unrelated parent.
#[allow(dead_code, reason = "used in tests")]
pub struct Family {
    /// Messenger holding all three accounts.
    pub messenger: Messenger,
    /// Parent of bob.
    pub alice: Arc<Session>,
    /// Child supervised by alice.
    pub bob: Arc<Session>,
    /// Parent with no children.
    pub carol: Arc<Session>,
}

/// Registers alice, bob and carol in `messenger`.
#[allow(dead_code, reason = "used in tests")]
pub fn family(messenger: Messenger) -> Family {
    let alice = messenger
        .register("alice", "secret1".to_string(), &NewAccountRole::Parent)
        .expect("register alice");
    messenger
        .create_child_account(&alice, "bob", "secret2".to_string())
        .expect("create bob");
    let bob = messenger
        .authenticate("bob", "secret2".to_string())
        .expect("authenticate bob");
    let carol = messenger
        .register("carol", "secret3".to_string(), &NewAccountRole::Parent)
        .expect("register carol");
    Family {
        messenger,
        alice,
        bob,
        carol,
    }
}

/// Family where alice has approved bob's contact request for carol.
#[allow(dead_code, reason = "used in tests")]
pub fn family_with_approved_contact() -> Family {
    let f = family(in_memory_messenger());
    let link = f
        .messenger
        .request_contact(&f.bob, "carol")
        .expect("request carol");
    f.messenger
        .decide_contact(&f.alice, link.id, true)
        .expect("approve carol");
    f
}
