//! # BoardService
//!
//! Translates board operations (create, list, view, report, delete) into
//! `ThreadStore` calls and owns the rules around them: text sanitization,
//! fresh identifiers, bump ordering, reply previews and redaction.

use std::collections::HashMap;
use std::sync::Arc;

use domains::{
    now_millis, BoardName, DomainError, FieldViolation, Reply, ReplyId, ReplyView, Result,
    Thread, ThreadId, ThreadStore, ThreadView, REDACTED_TEXT,
};
use tracing::{debug, info};

use crate::sanitize::{require_password, sanitize_text};

/// Tunables for the board listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardRules {
    /// Threads returned by the board listing.
    pub recent_thread_limit: usize,
    /// Replies shown per thread in the board listing.
    pub preview_reply_count: usize,
}

impl Default for BoardRules {
    fn default() -> Self {
        Self {
            recent_thread_limit: 10,
            preview_reply_count: 3,
        }
    }
}

/// Entry point for every board operation. Cheap to share behind an `Arc`.
pub struct BoardService {
    store: Arc<dyn ThreadStore>,
    rules: BoardRules,
}

impl BoardService {
    pub fn new(store: Arc<dyn ThreadStore>, rules: BoardRules) -> Self {
        Self { store, rules }
    }

    /// Makes sure `board` exists; used for the default board at startup.
    pub async fn ensure_board(&self, board: &BoardName) -> Result<()> {
        self.store.ensure_board(board).await?;
        Ok(())
    }

    /// Starts a new thread. `created_on` and `bumped_on` share one timestamp.
    pub async fn create_thread(
        &self,
        board: &BoardName,
        text: &str,
        delete_password: &str,
    ) -> Result<ThreadId> {
        let (text, delete_password) = validate_post(text, delete_password)?;
        let now = now_millis();
        let thread = Thread {
            id: ThreadId::generate(),
            board: board.clone(),
            text,
            created_on: now,
            bumped_on: now,
            reported: false,
            delete_password,
        };
        let id = thread.id.clone();

        self.store.insert_thread(thread).await?;
        info!(board = %board, thread_id = %id, "thread created");
        Ok(id)
    }

    /// Most recently bumped threads, each with a short preview of its
    /// newest replies (oldest first) and the full reply count.
    pub async fn list_recent_threads(&self, board: &BoardName) -> Result<Vec<ThreadView>> {
        let threads = self
            .store
            .recent_threads(board, self.rules.recent_thread_limit)
            .await?;
        if threads.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<ThreadId> = threads.iter().map(|t| t.id.clone()).collect();
        let mut by_thread: HashMap<ThreadId, Vec<Reply>> = HashMap::new();
        for reply in self.store.replies_for(board, &ids).await? {
            by_thread.entry(reply.thread_id.clone()).or_default().push(reply);
        }

        Ok(threads
            .into_iter()
            .map(|thread| {
                let replies = by_thread.remove(&thread.id).unwrap_or_default();
                preview_view(thread, replies, self.rules.preview_reply_count)
            })
            .collect())
    }

    /// A single thread with every reply, newest first.
    pub async fn get_thread(&self, board: &BoardName, id: &ThreadId) -> Result<ThreadView> {
        let thread = self
            .store
            .find_thread(board, id)
            .await?
            .ok_or_else(|| DomainError::NotFound("thread", id.to_string()))?;
        let replies = self
            .store
            .replies_for(board, std::slice::from_ref(id))
            .await?;
        Ok(full_view(thread, replies))
    }

    /// Flags a thread. Reporting needs no password.
    pub async fn report_thread(&self, board: &BoardName, id: &ThreadId) -> Result<()> {
        if !self.store.mark_thread_reported(board, id).await? {
            return Err(DomainError::NotFound("thread", id.to_string()));
        }
        info!(board = %board, thread_id = %id, "thread reported");
        Ok(())
    }

    /// Removes a thread and its replies. A wrong password and a missing
    /// thread both yield `InvalidDeletePassword`.
    pub async fn delete_thread(
        &self,
        board: &BoardName,
        id: &ThreadId,
        delete_password: &str,
    ) -> Result<()> {
        if !self.store.delete_thread(board, id, delete_password).await? {
            debug!(board = %board, thread_id = %id, "thread delete rejected");
            return Err(DomainError::InvalidDeletePassword);
        }
        info!(board = %board, thread_id = %id, "thread deleted");
        Ok(())
    }

    /// Appends a reply and bumps the parent thread.
    pub async fn create_reply(
        &self,
        board: &BoardName,
        thread_id: &ThreadId,
        text: &str,
        delete_password: &str,
    ) -> Result<ReplyId> {
        let (text, delete_password) = validate_post(text, delete_password)?;
        let reply = Reply {
            id: ReplyId::generate(),
            thread_id: thread_id.clone(),
            text,
            created_on: now_millis(),
            reported: false,
            delete_password,
        };
        let id = reply.id.clone();

        if !self.store.insert_reply(board, reply).await? {
            return Err(DomainError::NotFound("thread", thread_id.to_string()));
        }
        info!(board = %board, thread_id = %thread_id, reply_id = %id, "reply created");
        Ok(id)
    }

    pub async fn report_reply(
        &self,
        board: &BoardName,
        thread_id: &ThreadId,
        reply_id: &ReplyId,
    ) -> Result<()> {
        if !self
            .store
            .mark_reply_reported(board, thread_id, reply_id)
            .await?
        {
            return Err(DomainError::NotFound("reply", reply_id.to_string()));
        }
        info!(board = %board, thread_id = %thread_id, reply_id = %reply_id, "reply reported");
        Ok(())
    }

    /// Redacts a reply: only its text changes, to `[deleted]`.
    pub async fn delete_reply(
        &self,
        board: &BoardName,
        thread_id: &ThreadId,
        reply_id: &ReplyId,
        delete_password: &str,
    ) -> Result<()> {
        let redacted = self
            .store
            .overwrite_reply_text(board, thread_id, reply_id, delete_password, REDACTED_TEXT)
            .await?;
        if !redacted {
            debug!(board = %board, thread_id = %thread_id, reply_id = %reply_id, "reply delete rejected");
            return Err(DomainError::InvalidDeletePassword);
        }
        info!(board = %board, thread_id = %thread_id, reply_id = %reply_id, "reply redacted");
        Ok(())
    }
}

/// Collects every violation of a new post instead of stopping at the first.
fn validate_post(text: &str, delete_password: &str) -> Result<(String, String)> {
    let mut violations: Vec<FieldViolation> = Vec::new();
    let text = sanitize_text(text).map_err(|v| violations.push(v)).ok();
    let password = require_password(delete_password)
        .map_err(|v| violations.push(v))
        .ok();

    match (text, password) {
        (Some(text), Some(password)) => Ok((text, password.to_string())),
        _ => Err(DomainError::Validation(violations)),
    }
}

// Equal timestamps keep insertion order: the store returns replies in
// insertion order and both sorts below are stable.

fn preview_view(thread: Thread, mut replies: Vec<Reply>, keep: usize) -> ThreadView {
    replies.sort_by_key(|r| r.created_on);
    let replycount = replies.len();
    let newest = replies.split_off(replycount.saturating_sub(keep));
    ThreadView::new(
        thread,
        newest.into_iter().map(ReplyView::from).collect(),
        replycount,
    )
}

fn full_view(thread: Thread, mut replies: Vec<Reply>) -> ThreadView {
    replies.sort_by_key(|r| r.created_on);
    replies.reverse();
    let replycount = replies.len();
    ThreadView::new(
        thread,
        replies.into_iter().map(ReplyView::from).collect(),
        replycount,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use domains::MockThreadStore;

    fn board() -> BoardName {
        BoardName::parse("general").unwrap()
    }

    fn thread_at(created_on: DateTime<Utc>) -> Thread {
        Thread {
            id: ThreadId::generate(),
            board: board(),
            text: "op".into(),
            created_on,
            bumped_on: created_on,
            reported: false,
            delete_password: "pw".into(),
        }
    }

    fn reply_at(thread: &ThreadId, text: &str, created_on: DateTime<Utc>) -> Reply {
        Reply {
            id: ReplyId::generate(),
            thread_id: thread.clone(),
            text: text.into(),
            created_on,
            reported: false,
            delete_password: "pw".into(),
        }
    }

    fn service(store: MockThreadStore) -> BoardService {
        BoardService::new(Arc::new(store), BoardRules::default())
    }

    #[tokio::test]
    async fn create_thread_stores_sanitized_unreported_thread() {
        let mut store = MockThreadStore::new();
        store
            .expect_insert_thread()
            .withf(|t| {
                t.text == "&lt;b&gt;hi&lt;&#x2F;b&gt;"
                    && t.created_on == t.bumped_on
                    && !t.reported
                    && t.delete_password == "secret"
                    && t.board.as_str() == "general"
            })
            .times(1)
            .returning(|_| Ok(()));

        let id = service(store)
            .create_thread(&board(), "  <b>hi</b> ", "secret")
            .await
            .unwrap();
        assert_eq!(id.as_str().len(), domains::ID_LENGTH);
    }

    #[tokio::test]
    async fn create_thread_reports_every_violation_without_touching_store() {
        let store = MockThreadStore::new();
        let err = service(store)
            .create_thread(&board(), "   ", "")
            .await
            .unwrap_err();
        match err {
            DomainError::Validation(violations) => {
                let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
                assert_eq!(fields, ["text", "delete_password"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_thread_surfaces_store_failure() {
        let mut store = MockThreadStore::new();
        store
            .expect_insert_thread()
            .returning(|_| Err(anyhow::anyhow!("database is locked")));

        let err = service(store)
            .create_thread(&board(), "hello", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Persistence(_)));
    }

    #[tokio::test]
    async fn listing_keeps_three_newest_replies_oldest_first() {
        let base = Utc::now();
        let thread = thread_at(base);
        let tid = thread.id.clone();
        let replies: Vec<Reply> = (0..5)
            .map(|i| reply_at(&tid, &format!("r{i}"), base + Duration::seconds(i)))
            .collect();

        let mut store = MockThreadStore::new();
        store
            .expect_recent_threads()
            .withf(|_, limit| *limit == 10)
            .returning(move |_, _| Ok(vec![thread.clone()]));
        store
            .expect_replies_for()
            .returning(move |_, _| Ok(replies.clone()));

        let listed = service(store).list_recent_threads(&board()).await.unwrap();
        assert_eq!(listed.len(), 1);
        let texts: Vec<_> = listed[0].replies.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["r2", "r3", "r4"]);
        assert_eq!(listed[0].replycount, 5);
    }

    #[tokio::test]
    async fn listing_an_empty_board_skips_reply_lookup() {
        let mut store = MockThreadStore::new();
        store.expect_recent_threads().returning(|_, _| Ok(Vec::new()));
        store.expect_replies_for().never();

        let listed = service(store).list_recent_threads(&board()).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn get_thread_orders_replies_newest_first() {
        let base = Utc::now();
        let thread = thread_at(base);
        let tid = thread.id.clone();
        let replies = vec![
            reply_at(&tid, "first", base + Duration::seconds(1)),
            reply_at(&tid, "second", base + Duration::seconds(2)),
        ];

        let mut store = MockThreadStore::new();
        store
            .expect_find_thread()
            .returning(move |_, _| Ok(Some(thread.clone())));
        store
            .expect_replies_for()
            .returning(move |_, _| Ok(replies.clone()));

        let view = service(store).get_thread(&board(), &tid).await.unwrap();
        let texts: Vec<_> = view.replies.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["second", "first"]);
        assert_eq!(view.replycount, 2);
    }

    #[tokio::test]
    async fn get_missing_thread_is_not_found() {
        let mut store = MockThreadStore::new();
        store.expect_find_thread().returning(|_, _| Ok(None));

        let err = service(store)
            .get_thread(&board(), &ThreadId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound("thread", _)));
    }

    #[tokio::test]
    async fn report_missing_thread_is_not_found() {
        let mut store = MockThreadStore::new();
        store.expect_mark_thread_reported().returning(|_, _| Ok(false));

        let err = service(store)
            .report_thread(&board(), &ThreadId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(..)));
    }

    #[tokio::test]
    async fn wrong_thread_password_is_invalid_password() {
        let mut store = MockThreadStore::new();
        store
            .expect_delete_thread()
            .withf(|_, _, password| password == "wrong")
            .returning(|_, _, _| Ok(false));

        let err = service(store)
            .delete_thread(&board(), &ThreadId::generate(), "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidDeletePassword));
    }

    #[tokio::test]
    async fn reply_to_missing_thread_is_not_found() {
        let mut store = MockThreadStore::new();
        store.expect_insert_reply().returning(|_, _| Ok(false));

        let err = service(store)
            .create_reply(&board(), &ThreadId::generate(), "hi", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound("thread", _)));
    }

    #[tokio::test]
    async fn reply_targets_requested_thread() {
        let tid = ThreadId::generate();
        let expected = tid.clone();
        let mut store = MockThreadStore::new();
        store
            .expect_insert_reply()
            .withf(move |_, reply| reply.thread_id == expected && reply.text == "hi")
            .times(1)
            .returning(|_, _| Ok(true));

        service(store)
            .create_reply(&board(), &tid, " hi ", "pw")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_reply_writes_redaction_sentinel() {
        let mut store = MockThreadStore::new();
        store
            .expect_overwrite_reply_text()
            .withf(|_, _, _, password, text| password == "pw" && text == REDACTED_TEXT)
            .times(1)
            .returning(|_, _, _, _, _| Ok(true));

        service(store)
            .delete_reply(&board(), &ThreadId::generate(), &ReplyId::generate(), "pw")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_reply_with_wrong_password_is_rejected() {
        let mut store = MockThreadStore::new();
        store
            .expect_overwrite_reply_text()
            .returning(|_, _, _, _, _| Ok(false));

        let err = service(store)
            .delete_reply(&board(), &ThreadId::generate(), &ReplyId::generate(), "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidDeletePassword));
    }
}
