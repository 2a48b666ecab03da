//! Behaviour every `ThreadStore` backend must share.
//!
//! Each scenario is written once against `&dyn ThreadStore` and instantiated
//! for the memory and SQLite backends by `store_contract!`.

use chrono::Duration;
use domains::{now_millis, BoardName, Reply, ReplyId, Thread, ThreadId, ThreadStore};
use tokio_test::{assert_err, assert_ok};

fn board(name: &str) -> BoardName {
    BoardName::parse(name).unwrap()
}

fn new_thread(board: &BoardName, text: &str, offset_secs: i64) -> Thread {
    let at = now_millis() + Duration::seconds(offset_secs);
    Thread {
        id: ThreadId::generate(),
        board: board.clone(),
        text: text.into(),
        created_on: at,
        bumped_on: at,
        reported: false,
        delete_password: "thread-pw".into(),
    }
}

fn new_reply(thread: &Thread, text: &str, offset_secs: i64) -> Reply {
    Reply {
        id: ReplyId::generate(),
        thread_id: thread.id.clone(),
        text: text.into(),
        created_on: thread.created_on + Duration::seconds(offset_secs),
        reported: false,
        delete_password: "reply-pw".into(),
    }
}

async fn recent_threads_are_bump_ordered(store: &dyn ThreadStore) {
    let general = board("general");
    let old = new_thread(&general, "old", 0);
    let newer = new_thread(&general, "newer", 10);
    assert_ok!(store.insert_thread(old.clone()).await);
    assert_ok!(store.insert_thread(newer.clone()).await);

    let texts: Vec<String> = store
        .recent_threads(&general, 10)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.text)
        .collect();
    assert_eq!(texts, ["newer", "old"]);

    // A reply on the old thread bumps it to the top.
    assert!(store.insert_reply(&general, new_reply(&old, "bump", 60)).await.unwrap());
    let listed = store.recent_threads(&general, 10).await.unwrap();
    assert_eq!(listed[0].id, old.id);
    assert_eq!(listed[0].bumped_on, old.created_on + Duration::seconds(60));
    assert_eq!(listed[0].created_on, old.created_on);

    assert_eq!(store.recent_threads(&general, 1).await.unwrap().len(), 1);
}

async fn boards_are_isolated(store: &dyn ThreadStore) {
    let general = board("general");
    let other = board("other");
    let thread = new_thread(&general, "mine", 0);
    assert_ok!(store.insert_thread(thread.clone()).await);

    assert!(store.recent_threads(&other, 10).await.unwrap().is_empty());
    assert!(store.find_thread(&other, &thread.id).await.unwrap().is_none());
    assert!(!store.mark_thread_reported(&other, &thread.id).await.unwrap());
    assert!(!store.delete_thread(&other, &thread.id, "thread-pw").await.unwrap());
    assert!(!store
        .insert_reply(&other, new_reply(&thread, "stray", 1))
        .await
        .unwrap());
    assert!(store.find_thread(&general, &thread.id).await.unwrap().is_some());
}

async fn bump_never_moves_backwards(store: &dyn ThreadStore) {
    let general = board("general");
    let thread = new_thread(&general, "op", 0);
    assert_ok!(store.insert_thread(thread.clone()).await);

    assert!(store.insert_reply(&general, new_reply(&thread, "late", 30)).await.unwrap());
    assert!(store.insert_reply(&general, new_reply(&thread, "skewed", 5)).await.unwrap());

    let stored = store.find_thread(&general, &thread.id).await.unwrap().unwrap();
    assert_eq!(stored.bumped_on, thread.created_on + Duration::seconds(30));
}

async fn thread_reporting_and_deletion(store: &dyn ThreadStore) {
    let general = board("general");
    let thread = new_thread(&general, "op", 0);
    assert_ok!(store.insert_thread(thread.clone()).await);
    assert!(store.insert_reply(&general, new_reply(&thread, "r", 1)).await.unwrap());

    assert!(store.mark_thread_reported(&general, &thread.id).await.unwrap());
    assert!(store.mark_thread_reported(&general, &thread.id).await.unwrap());
    let stored = store.find_thread(&general, &thread.id).await.unwrap().unwrap();
    assert!(stored.reported);

    assert!(!store.delete_thread(&general, &thread.id, "wrong").await.unwrap());
    assert!(store.find_thread(&general, &thread.id).await.unwrap().is_some());

    assert!(store.delete_thread(&general, &thread.id, "thread-pw").await.unwrap());
    assert!(store.find_thread(&general, &thread.id).await.unwrap().is_none());
    assert!(store
        .replies_for(&general, std::slice::from_ref(&thread.id))
        .await
        .unwrap()
        .is_empty());
}

async fn replies_keep_insertion_order_per_thread(store: &dyn ThreadStore) {
    let general = board("general");
    let first = new_thread(&general, "first", 0);
    let second = new_thread(&general, "second", 1);
    assert_ok!(store.insert_thread(first.clone()).await);
    assert_ok!(store.insert_thread(second.clone()).await);

    for (i, text) in ["a", "b", "c"].into_iter().enumerate() {
        let reply = new_reply(&first, text, 2 + i as i64);
        assert!(store.insert_reply(&general, reply).await.unwrap());
    }
    assert!(store.insert_reply(&general, new_reply(&second, "x", 2)).await.unwrap());

    let replies = store
        .replies_for(&general, std::slice::from_ref(&first.id))
        .await
        .unwrap();
    let texts: Vec<&str> = replies.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, ["a", "b", "c"]);
    assert!(replies.iter().all(|r| r.thread_id == first.id));

    let both = store
        .replies_for(&general, &[first.id.clone(), second.id.clone()])
        .await
        .unwrap();
    assert_eq!(both.len(), 4);
    assert!(store.replies_for(&general, &[]).await.unwrap().is_empty());
}

async fn reply_reporting_and_redaction(store: &dyn ThreadStore) {
    let general = board("general");
    let thread = new_thread(&general, "op", 0);
    assert_ok!(store.insert_thread(thread.clone()).await);
    let reply = new_reply(&thread, "original", 1);
    assert!(store.insert_reply(&general, reply.clone()).await.unwrap());

    assert!(store
        .mark_reply_reported(&general, &thread.id, &reply.id)
        .await
        .unwrap());
    assert!(!store
        .mark_reply_reported(&general, &thread.id, &ReplyId::generate())
        .await
        .unwrap());

    assert!(!store
        .overwrite_reply_text(&general, &thread.id, &reply.id, "wrong", "[deleted]")
        .await
        .unwrap());
    assert!(store
        .overwrite_reply_text(&general, &thread.id, &reply.id, "reply-pw", "[deleted]")
        .await
        .unwrap());

    let stored = store
        .replies_for(&general, std::slice::from_ref(&thread.id))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].text, "[deleted]");
    assert_eq!(stored[0].id, reply.id);
    assert_eq!(stored[0].created_on, reply.created_on);
    assert!(stored[0].reported);
}

async fn duplicate_thread_ids_are_rejected(store: &dyn ThreadStore) {
    let general = board("general");
    let thread = new_thread(&general, "op", 0);
    assert_ok!(store.insert_thread(thread.clone()).await);
    assert_err!(store.insert_thread(thread).await);
}

async fn ensured_boards_start_empty(store: &dyn ThreadStore) {
    let general = board("general");
    assert_ok!(store.ensure_board(&general).await);
    assert_ok!(store.ensure_board(&general).await);
    assert!(store.recent_threads(&general, 10).await.unwrap().is_empty());

    // An existing board keeps its threads.
    let thread = new_thread(&general, "op", 0);
    assert_ok!(store.insert_thread(thread.clone()).await);
    assert_ok!(store.ensure_board(&general).await);
    assert_eq!(store.recent_threads(&general, 10).await.unwrap().len(), 1);
}

macro_rules! store_contract {
    ($module:ident, $make:expr) => {
        mod $module {
            #[tokio::test]
            async fn recent_threads_are_bump_ordered() {
                super::recent_threads_are_bump_ordered(&$make).await;
            }

            #[tokio::test]
            async fn boards_are_isolated() {
                super::boards_are_isolated(&$make).await;
            }

            #[tokio::test]
            async fn bump_never_moves_backwards() {
                super::bump_never_moves_backwards(&$make).await;
            }

            #[tokio::test]
            async fn thread_reporting_and_deletion() {
                super::thread_reporting_and_deletion(&$make).await;
            }

            #[tokio::test]
            async fn replies_keep_insertion_order_per_thread() {
                super::replies_keep_insertion_order_per_thread(&$make).await;
            }

            #[tokio::test]
            async fn reply_reporting_and_redaction() {
                super::reply_reporting_and_redaction(&$make).await;
            }

            #[tokio::test]
            async fn ensured_boards_start_empty() {
                super::ensured_boards_start_empty(&$make).await;
            }

            #[tokio::test]
            async fn duplicate_thread_ids_are_rejected() {
                super::duplicate_thread_ids_are_rejected(&$make).await;
            }
        }
    };
}

store_contract!(memory, storage_adapters::MemoryThreadStore::new());

#[cfg(feature = "db-sqlite")]
store_contract!(
    sqlite,
    storage_adapters::SqliteThreadStore::in_memory().await.unwrap()
);
