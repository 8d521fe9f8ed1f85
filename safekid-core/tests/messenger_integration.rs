//! End-to-end tests of the messenger facade on an in-memory store.

mod common;

use safekid_core::{
    ApprovalState, ContactState, DecisionOutcome, DecisionSubject, MessengerError,
    NewAccountRole, Role,
};
use test_case::test_case;

#[test]
fn test_register_then_authenticate_keeps_role() {
    let f = common::family(common::in_memory_messenger());

    let alice = f
        .messenger
        .authenticate("alice", "secret1".to_string())
        .expect("authenticate alice");
    assert_eq!(alice.role(), Role::Parent);
    assert_eq!(f.bob.role(), Role::Child);
    assert_eq!(f.bob.caller().guardian_id, Some(alice.caller().id));
}

#[test]
fn test_wrong_password_is_rejected() {
    let f = common::family(common::in_memory_messenger());
    let err = f
        .messenger
        .authenticate("alice", "not-her-password".to_string())
        .expect_err("wrong password");
    assert!(matches!(err, MessengerError::InvalidCredentials));
}

#[test_case("", "secret1" ; "empty username")]
#[test_case("bad name", "secret1" ; "space in username")]
#[test_case("eve!", "secret1" ; "punctuation in username")]
#[test_case("élodie", "secret1" ; "non ascii username")]
fn test_invalid_usernames(username: &str, password: &str) {
    let messenger = common::in_memory_messenger();
    let err = messenger
        .register(username, password.to_string(), &NewAccountRole::Parent)
        .expect_err("invalid username");
    assert!(matches!(err, MessengerError::InvalidUsername));
}

#[test_case("" ; "empty password")]
#[test_case("12345" ; "five characters")]
fn test_weak_passwords(password: &str) {
    let messenger = common::in_memory_messenger();
    let err = messenger
        .register("dave", password.to_string(), &NewAccountRole::Parent)
        .expect_err("weak password");
    assert!(matches!(err, MessengerError::WeakPassword { min_length: 6 }));
    assert!(matches!(
        messenger.authenticate("dave", password.to_string()),
        Err(MessengerError::InvalidCredentials)
    ));
}

#[test]
fn test_child_registration_names_guardian() {
    let f = common::family(common::in_memory_messenger());
    let zoe = f
        .messenger
        .register(
            "zoe",
            "secret4".to_string(),
            &NewAccountRole::Child {
                guardian_username: "carol".to_string(),
            },
        )
        .expect("register zoe");
    assert_eq!(zoe.caller().guardian_id, Some(f.carol.caller().id));

    let err = f
        .messenger
        .register(
            "yan",
            "secret5".to_string(),
            &NewAccountRole::Child {
                guardian_username: "bob".to_string(),
            },
        )
        .expect_err("children cannot be guardians");
    assert!(matches!(err, MessengerError::UnknownGuardian));
}

#[test]
fn test_contact_grant_and_denial() {
    let f = common::family(common::in_memory_messenger());
    let link = f
        .messenger
        .request_contact(&f.bob, "carol")
        .expect("request");
    assert_eq!(link.state, ContactState::Pending);
    assert!(!f
        .messenger
        .is_contact_approved(&f.bob, "carol")
        .expect("check"));

    let pending = f
        .messenger
        .pending_contact_requests(&f.alice)
        .expect("pending");
    assert_eq!(pending, vec![link.clone()]);
    assert!(f
        .messenger
        .pending_contact_requests(&f.carol)
        .expect("pending")
        .is_empty());

    f.messenger
        .decide_contact(&f.alice, link.id, true)
        .expect("grant");
    assert!(f
        .messenger
        .is_contact_approved(&f.bob, "carol")
        .expect("check"));

    f.messenger
        .decide_contact(&f.alice, link.id, false)
        .expect("revoke");
    assert!(!f
        .messenger
        .is_contact_approved(&f.bob, "carol")
        .expect("check"));
    assert!(f
        .messenger
        .approved_contacts(&f.bob)
        .expect("contacts")
        .is_empty());
    assert_eq!(
        f.messenger.contact_links(&f.bob).expect("links")[0].state,
        ContactState::Rejected
    );
}

#[test]
fn test_only_the_childs_guardian_decides_contacts() {
    let f = common::family(common::in_memory_messenger());
    let link = f
        .messenger
        .request_contact(&f.bob, "carol")
        .expect("request");

    let err = f
        .messenger
        .decide_contact(&f.carol, link.id, true)
        .expect_err("carol is not bob's guardian");
    assert!(matches!(err, MessengerError::NotGuardian));

    let err = f
        .messenger
        .decide_contact(&f.bob, link.id, true)
        .expect_err("children cannot decide");
    assert!(matches!(err, MessengerError::Forbidden));
}

#[test]
fn test_role_gates() {
    let f = common::family(common::in_memory_messenger());
    assert!(matches!(
        f.messenger.request_contact(&f.alice, "carol"),
        Err(MessengerError::Forbidden)
    ));
    assert!(matches!(
        f.messenger
            .create_child_account(&f.bob, "tim", "secret9".to_string()),
        Err(MessengerError::Forbidden)
    ));
    assert!(matches!(
        f.messenger.pending_messages(&f.bob),
        Err(MessengerError::Forbidden)
    ));
    assert!(matches!(
        f.messenger.child_thread(&f.carol, "bob"),
        Err(MessengerError::Forbidden)
    ));
    assert!(matches!(
        f.messenger.child_thread(&f.alice, "nobody"),
        Err(MessengerError::UnknownTarget)
    ));
    assert!(matches!(
        f.messenger.conversation(&f.bob, "nobody"),
        Err(MessengerError::UnknownTarget)
    ));
}

#[test]
fn test_unapproved_contact_blocks_send() {
    let f = common::family(common::in_memory_messenger());
    f.messenger
        .request_contact(&f.bob, "carol")
        .expect("request");

    let err = f
        .messenger
        .send_message(&f.bob, "carol", "hi")
        .expect_err("not approved yet");
    assert!(matches!(err, MessengerError::ContactNotApproved));

    let thread = f.messenger.child_thread(&f.alice, "bob").expect("thread");
    assert!(thread.messages().expect("messages").is_empty());
    assert!(f
        .messenger
        .pending_messages(&f.alice)
        .expect("pending")
        .is_empty());
}

#[test]
fn test_parent_message_is_visible_to_both_sides() {
    let f = common::family_with_approved_contact();
    let sent = f
        .messenger
        .send_message(&f.carol, "bob", "hello bob")
        .expect("send");
    assert_eq!(sent.message.approval_state, ApprovalState::AutoApproved);

    let for_bob = f.messenger.conversation(&f.bob, "carol").expect("query");
    let for_carol = f.messenger.conversation(&f.carol, "bob").expect("query");
    assert_eq!(for_bob.transcript().expect("bob view"), vec!["carol: hello bob"]);
    assert_eq!(
        for_carol.transcript().expect("carol view"),
        vec!["carol: hello bob"]
    );
}

#[test]
fn test_child_message_hidden_until_approved_and_rejection_is_final() {
    let f = common::family_with_approved_contact();
    let view = f.messenger.conversation(&f.bob, "carol").expect("query");

    let first = f
        .messenger
        .send_message(&f.bob, "carol", "hi")
        .expect("send")
        .message;
    let second = f
        .messenger
        .send_message(&f.bob, "carol", "are you there")
        .expect("send")
        .message;
    assert!(view.messages().expect("messages").is_empty());

    f.messenger
        .decide_message(&f.alice, first.id, true)
        .expect("approve");
    f.messenger
        .decide_message(&f.alice, second.id, false)
        .expect("reject");
    assert_eq!(view.transcript().expect("transcript"), vec!["bob: hi"]);

    let err = f
        .messenger
        .decide_message(&f.alice, second.id, true)
        .expect_err("rejection is final");
    assert!(matches!(err, MessengerError::DecisionClosed));
    assert_eq!(view.transcript().expect("transcript"), vec!["bob: hi"]);

    let thread = f.messenger.child_thread(&f.alice, "bob").expect("thread");
    assert_eq!(
        thread.transcript().expect("thread"),
        vec!["bob: hi", "bob: are you there [rejected]"]
    );
}

#[test]
fn test_parent_views_include_pending_messages() {
    let f = common::family_with_approved_contact();
    f.messenger
        .send_message(&f.bob, "carol", "psst")
        .expect("send");
    let carol_view = f.messenger.conversation(&f.carol, "bob").expect("query");
    assert_eq!(
        carol_view.transcript().expect("transcript"),
        vec!["bob: psst [pending]"]
    );
    let pending = f.messenger.pending_messages(&f.alice).expect("pending");
    assert_eq!(pending.len(), 1);
    assert!(f
        .messenger
        .pending_messages(&f.carol)
        .expect("pending")
        .is_empty());
}

#[test]
fn test_filter_masks_outgoing_messages() {
    let f = common::family_with_approved_contact();
    let sent = f
        .messenger
        .send_message(&f.carol, "bob", "That is BAD, do not hate")
        .expect("send");
    assert!(sent.was_filtered);
    assert_eq!(sent.message.body, "That is ***, do not ***");

    let clean = f
        .messenger
        .send_message(&f.carol, "bob", "see you soon")
        .expect("send");
    assert!(!clean.was_filtered);
    assert_eq!(clean.message.body, "see you soon");

    let preview = f.messenger.preview_filter("stupid");
    assert_eq!(preview.text, "***");
    assert_eq!(
        f.messenger.content_filter().terms(),
        vec!["bad", "hate", "stupid"]
    );
}

#[test]
fn test_decision_history() {
    let f = common::family_with_approved_contact();
    let link = f.messenger.contact_links(&f.bob).expect("links")[0].clone();
    let subject = DecisionSubject::Contact { link_id: link.id };

    let history = f
        .messenger
        .decision_history(&f.alice, subject)
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].outcome, DecisionOutcome::Approved);
    assert_eq!(history[0].guardian_id, f.alice.caller().id);

    let err = f
        .messenger
        .decision_history(&f.carol, subject)
        .expect_err("carol cannot see alice's decisions");
    assert!(matches!(err, MessengerError::NotGuardian));

    let message = f
        .messenger
        .send_message(&f.bob, "carol", "hi")
        .expect("send")
        .message;
    f.messenger
        .decide_message(&f.alice, message.id, true)
        .expect("approve");
    f.messenger
        .decide_message(&f.alice, message.id, false)
        .expect("reject after approval");
    let outcomes: Vec<DecisionOutcome> = f
        .messenger
        .decision_history(
            &f.alice,
            DecisionSubject::Message {
                message_id: message.id,
            },
        )
        .expect("history")
        .into_iter()
        .map(|decision| decision.outcome)
        .collect();
    assert_eq!(
        outcomes,
        vec![DecisionOutcome::Approved, DecisionOutcome::Rejected]
    );
}

#[test]
fn test_alice_bob_carol_scenario() {
    let messenger = common::in_memory_messenger();
    let alice = messenger
        .register("alice", "secret1".to_string(), &NewAccountRole::Parent)
        .expect("register alice");
    messenger
        .create_child_account(&alice, "bob", "secret2".to_string())
        .expect("create bob");
    let bob = messenger
        .authenticate("bob", "secret2".to_string())
        .expect("authenticate bob");
    let dave = messenger
        .register("dave", "secret3".to_string(), &NewAccountRole::Parent)
        .expect("register dave");
    messenger
        .create_child_account(&dave, "carol", "secret4".to_string())
        .expect("create carol");

    let link = messenger.request_contact(&bob, "carol").expect("request");
    messenger
        .decide_contact(&alice, link.id, true)
        .expect("alice approves");

    let sent = messenger
        .send_message(&bob, "carol", "hi")
        .expect("bob sends");
    let conversation = messenger.conversation(&bob, "carol").expect("query");
    assert!(conversation.messages().expect("messages").is_empty());

    let pending = messenger.pending_messages(&dave).expect("dave's queue");
    assert_eq!(pending, vec![sent.message.clone()]);
    messenger
        .decide_message(&dave, sent.message.id, true)
        .expect("carol's parent approves");

    assert_eq!(conversation.transcript().expect("transcript"), vec!["bob: hi"]);
}

#[test]
fn test_sessions_are_bound_to_their_messenger() {
    let other = common::in_memory_messenger();
    let mallory = other
        .register("mallory", "secret6".to_string(), &NewAccountRole::Parent)
        .expect("register mallory");
    let f = common::family(common::in_memory_messenger());
    assert_eq!(mallory.caller().id, f.alice.caller().id);

    let link = f
        .messenger
        .request_contact(&f.bob, "carol")
        .expect("request");
    assert!(matches!(
        f.messenger.list_children(&mallory),
        Err(MessengerError::Forbidden)
    ));
    assert!(matches!(
        f.messenger.decide_contact(&mallory, link.id, true),
        Err(MessengerError::Forbidden)
    ));
    assert!(matches!(
        f.messenger.send_message(&mallory, "bob", "hi"),
        Err(MessengerError::Forbidden)
    ));
    assert!(matches!(
        f.messenger.conversation(&mallory, "bob"),
        Err(MessengerError::Forbidden)
    ));
    assert!(matches!(
        other.list_children(&f.alice),
        Err(MessengerError::Forbidden)
    ));
    assert_eq!(
        f.messenger.contact_links(&f.bob).expect("links")[0].state,
        ContactState::Pending
    );
}
