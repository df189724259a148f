//! Integration tests for the client session over the real chat store
//!
//! Exercises the complete optimistic-update cycle: cache population,
//! synchronous override, cache invalidation, asynchronous persistence,
//! and confirm-or-revert — all against `SqliteStorage` through
//! `LocalBackend`.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use ulid::Ulid;

use backchat::client::{ChatListSession, LocalBackend};
use backchat::pagination::PageParams;
use backchat::storage::{Chat, SqliteStorage, Visibility};

fn test_storage() -> (Arc<SqliteStorage>, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let storage = Arc::new(
        SqliteStorage::new_with_path(dir.path().join("chats.db"))
            .expect("Failed to create storage"),
    );
    (storage, dir)
}

fn session_for(storage: &Arc<SqliteStorage>, owner: &str) -> ChatListSession {
    let backend = Arc::new(LocalBackend::new(Arc::clone(storage), owner));
    ChatListSession::new(owner, backend)
}

/// Seed `count` chats for `owner`, returning them newest-first.
fn seed_chats(storage: &SqliteStorage, owner: &str, count: usize) -> Vec<Chat> {
    let base = DateTime::<Utc>::from_timestamp_micros(1_700_000_000_000_000).unwrap();

    let mut chats = Vec::new();
    for i in 0..count {
        let created_at = base + Duration::seconds(i as i64);
        let chat = Chat {
            id: Ulid::from_parts(created_at.timestamp_millis() as u64, i as u128).to_string(),
            owner_id: owner.to_string(),
            title: format!("chat {}", i),
            visibility: Visibility::Private,
            created_at,
        };
        storage.insert_chat(&chat).expect("seed insert failed");
        chats.push(chat);
    }

    chats.reverse();
    chats
}

#[tokio::test]
async fn test_session_walks_pages_through_the_store() {
    let (storage, _dir) = test_storage();
    let chats = seed_chats(&storage, "alice", 25);
    let session = session_for(&storage, "alice");

    let first = session
        .load_page(&PageParams::first(10))
        .await
        .expect("first page failed");
    assert_eq!(first.chats, chats[..10].to_vec());
    assert!(first.has_more);

    let second = session
        .load_page(&PageParams::after(&first.chats[9], 10))
        .await
        .expect("second page failed");
    assert_eq!(second.chats, chats[10..20].to_vec());
    assert!(second.has_more);

    let third = session
        .load_page(&PageParams::after(&second.chats[9], 10))
        .await
        .expect("third page failed");
    assert_eq!(third.chats.len(), 5);
    assert!(!third.has_more);
}

#[tokio::test]
async fn test_visibility_edit_round_trips_through_the_store() {
    let (storage, _dir) = test_storage();
    let chats = seed_chats(&storage, "alice", 3);
    let session = session_for(&storage, "alice");

    session
        .load_page(&PageParams::first(10))
        .await
        .expect("load failed");
    assert_eq!(
        session.displayed_visibility(&chats[1].id),
        Visibility::Private
    );

    session
        .set_visibility(&chats[1].id, Visibility::Public)
        .await
        .expect("write failed");

    // The store holds the new value and the refetched page agrees.
    let stored = storage
        .get_chat(&chats[1].id)
        .expect("get failed")
        .expect("chat missing");
    assert_eq!(stored.visibility, Visibility::Public);

    let page = session
        .load_page(&PageParams::first(10))
        .await
        .expect("reload failed");
    let listed = page
        .chats
        .iter()
        .find(|c| c.id == chats[1].id)
        .expect("chat missing from page");
    assert_eq!(listed.visibility, Visibility::Public);
    assert_eq!(
        session.displayed_visibility(&chats[1].id),
        Visibility::Public
    );
    assert!(session.take_notifications().is_empty());
}

#[tokio::test]
async fn test_failed_write_against_missing_chat_reverts() {
    let (storage, _dir) = test_storage();
    let chats = seed_chats(&storage, "alice", 2);
    let session = session_for(&storage, "alice");

    session
        .load_page(&PageParams::first(10))
        .await
        .expect("load failed");

    // Delete behind the session's back so the write fails server-side.
    storage
        .delete_chat("alice", &chats[0].id)
        .expect("delete failed");

    let result = session.set_visibility(&chats[0].id, Visibility::Public).await;
    assert!(result.is_err());

    // Rolled back to the pre-edit value, with exactly one notification.
    assert_eq!(
        session.displayed_visibility(&chats[0].id),
        Visibility::Private
    );
    let notifications = session.take_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].chat_id, chats[0].id);
}

#[tokio::test]
async fn test_sessions_do_not_see_each_others_chats() {
    let (storage, _dir) = test_storage();
    seed_chats(&storage, "alice", 4);
    seed_chats(&storage, "bob", 2);

    let alice = session_for(&storage, "alice");
    let bob = session_for(&storage, "bob");

    let alice_page = alice
        .load_page(&PageParams::first(10))
        .await
        .expect("load failed");
    let bob_page = bob
        .load_page(&PageParams::first(10))
        .await
        .expect("load failed");

    assert_eq!(alice_page.chats.len(), 4);
    assert_eq!(bob_page.chats.len(), 2);
    assert!(bob_page.chats.iter().all(|c| c.owner_id == "bob"));
}

#[tokio::test]
async fn test_edit_then_refetch_shows_no_pending_state() {
    let (storage, _dir) = test_storage();
    let chats = seed_chats(&storage, "alice", 1);
    let session = session_for(&storage, "alice");

    session
        .load_page(&PageParams::first(10))
        .await
        .expect("load failed");
    session
        .set_visibility(&chats[0].id, Visibility::Public)
        .await
        .expect("write failed");

    // Once confirmed, the override is gone; the cache refresh carries the
    // new value on its own.
    assert!(!session.has_pending_edit(&chats[0].id));
    let page = session
        .load_page(&PageParams::first(10))
        .await
        .expect("reload failed");
    assert_eq!(page.chats[0].visibility, Visibility::Public);
    assert!(!session.has_pending_edit(&chats[0].id));
}
