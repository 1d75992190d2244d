use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use huddle_chat::{Chat, ChatError};
use huddle_db::Database;
use huddle_types::models::PageRequest;
use proptest::prelude::*;

fn in_memory_chat() -> Chat {
    Chat::new(Arc::new(Database::open_in_memory().unwrap()))
}

fn user_id() -> impl Strategy<Value = String> {
    "[a-z0-9-]{1,12}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn dm_identity_ignores_argument_order(a in user_id(), b in user_id()) {
        let chat = in_memory_chat();

        let first = chat.conversations.create_or_get(&a, &b).unwrap();
        let reversed = chat.conversations.create_or_get(&b, &a).unwrap();
        let again = chat.conversations.create_or_get(&a, &b).unwrap();

        prop_assert_eq!(&first.id, &reversed.id);
        prop_assert_eq!(&first.id, &again.id);
        prop_assert!(first.user1_id <= first.user2_id);
        prop_assert!(first.has_participant(&a) && first.has_participant(&b));
    }

    #[test]
    fn outsiders_cannot_append(outsider in "x[a-z]{1,8}", content in ".{1,40}") {
        let chat = in_memory_chat();
        let general = chat.channels.create("general", None, "owner").unwrap().channel;
        chat.channel_messages.send(&general.id, "owner", "seed").unwrap();

        let err = chat.channel_messages.send(&general.id, &outsider, &content).unwrap_err();
        prop_assert!(matches!(err, ChatError::Unauthorized(_)));

        let page = chat.channel_messages.history(&general.id, "owner", PageRequest::new(0, 50)).unwrap();
        prop_assert_eq!(page.total_elements, 1);
        prop_assert!(page.content.iter().all(|m| m.sender_id == "owner"));
    }

    #[test]
    fn pagination_covers_every_message_once(n in 0usize..60, k in 1u32..15) {
        let chat = in_memory_chat();
        let general = chat.channels.create("general", None, "u1").unwrap().channel;
        for i in 0..n {
            chat.channel_messages.send(&general.id, "u1", &format!("{}", i)).unwrap();
        }

        let expected_pages = n.div_ceil(k as usize);
        let mut seen = Vec::new();
        for p in 0..expected_pages {
            let page = chat
                .channel_messages
                .history(&general.id, "u1", PageRequest::new(p as u32, k))
                .unwrap();
            prop_assert_eq!(page.total_elements, n as u64);
            prop_assert_eq!(page.total_pages, expected_pages as u64);
            prop_assert!(!page.content.is_empty());
            seen.extend(page.content);
        }

        let past_end = chat
            .channel_messages
            .history(&general.id, "u1", PageRequest::new(expected_pages as u32, k))
            .unwrap();
        prop_assert!(past_end.content.is_empty());

        // newest first: bodies count down from n-1 to 0
        let bodies: Vec<usize> = seen.iter().map(|m| m.content.parse().unwrap()).collect();
        let expected: Vec<usize> = (0..n).rev().collect();
        prop_assert_eq!(bodies, expected);

        let ids: HashSet<_> = seen.iter().map(|m| m.id.clone()).collect();
        prop_assert_eq!(ids.len(), n);
        prop_assert!(seen.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_joins_yield_one_membership() {
    const ATTEMPTS: usize = 16;

    let dir = tempfile::tempdir().unwrap();
    let chat = Arc::new(Chat::new(Arc::new(
        Database::open(&dir.path().join("chat.db")).unwrap(),
    )));
    let general = chat.channels.create("general", None, "owner").unwrap().channel;

    let tasks = (0..ATTEMPTS).map(|_| {
        let chat = chat.clone();
        let channel_id = general.id.clone();
        tokio::task::spawn_blocking(move || chat.members.add_member(&channel_id, "joiner"))
    });
    let results: Vec<_> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();

    let joined = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(ChatError::Conflict(_))))
        .count();

    assert_eq!(joined, 1);
    assert_eq!(conflicts, ATTEMPTS - 1);
    assert_eq!(chat.channels.get(&general.id).unwrap().member_count, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dm_creation_converges() {
    const ATTEMPTS: usize = 16;

    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(Database::open(&dir.path().join("chat.db")).unwrap());
    let chat = Arc::new(Chat::new(db.clone()));

    let tasks = (0..ATTEMPTS).map(|i| {
        let chat = chat.clone();
        tokio::task::spawn_blocking(move || {
            // alternate initiator to exercise both argument orders
            if i % 2 == 0 {
                chat.conversations.create_or_get("alice", "bob")
            } else {
                chat.conversations.create_or_get("bob", "alice")
            }
        })
    });
    let ids: HashSet<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap().id)
        .collect();

    assert_eq!(ids.len(), 1);
    assert_eq!(db.dm_conversations_for_user("alice").unwrap().len(), 1);
}

#[test]
fn general_channel_lifecycle() {
    let chat = in_memory_chat();

    let general = chat.channels.create("general", None, "u1").unwrap().channel;
    assert!(chat.members.is_member(&general.id, "u1").unwrap());

    chat.members.add_member(&general.id, "u2").unwrap();
    assert!(chat.members.is_member(&general.id, "u2").unwrap());

    chat.channel_messages.send(&general.id, "u2", "hi").unwrap();
    let page = chat
        .channel_messages
        .history(&general.id, "u2", PageRequest::new(0, 20))
        .unwrap();
    assert_eq!(page.content[0].content, "hi");

    chat.members.remove_member(&general.id, "u2").unwrap();
    assert!(!chat.members.is_member(&general.id, "u2").unwrap());

    let err = chat.channel_messages.send(&general.id, "u2", "still here?").unwrap_err();
    assert!(matches!(err, ChatError::Unauthorized(_)));
}

#[test]
fn dm_conversation_scenario() {
    let chat = in_memory_chat();

    let x = chat.conversations.create_or_get("user-a", "user-b").unwrap();
    let from_b = chat.conversations.create_or_get("user-b", "user-a").unwrap();
    assert_eq!(x.id, from_b.id);

    chat.direct_messages.send(&x.id, "user-a", "hello").unwrap();
    let page = chat
        .direct_messages
        .history(&x.id, "user-b", PageRequest::new(0, 20))
        .unwrap();

    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].content, "hello");
    assert_eq!(page.content[0].sender_id, "user-a");
    assert_eq!(page.content[0].parent_id, x.id);
}

#[test]
fn duplicate_channel_name_conflicts() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let chat = Chat::new(db.clone());

    chat.channels.create("general", None, "u1").unwrap();
    let err = chat.channels.create("general", Some("again"), "u2").unwrap_err();

    assert!(matches!(err, ChatError::Conflict(_)));
    assert!(err.to_string().contains("name already exists"));
    assert_eq!(chat.channels.list_all().unwrap().len(), 1);
    assert!(chat.members.list_channels_for_user("u2").unwrap().is_empty());
}
