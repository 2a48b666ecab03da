//! # Core Traits (Ports)
//!
//! Any storage backend must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::models::{BoardName, Reply, ReplyId, Thread, ThreadId};

/// Persistence contract for boards, threads, and replies.
///
/// Every method touches a single thread record (and its replies), so a
/// backend only needs atomic single-record updates. Methods returning
/// `bool` report whether a matching record existed and was changed.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ThreadStore: Send + Sync {
    // Board Operations
    async fn ensure_board(&self, board: &BoardName) -> anyhow::Result<()>;

    // Thread Operations

    /// Inserts a thread, creating its board on first use.
    async fn insert_thread(&self, thread: Thread) -> anyhow::Result<()>;
    /// Threads of a board, most recently bumped first.
    async fn recent_threads(&self, board: &BoardName, limit: usize)
        -> anyhow::Result<Vec<Thread>>;
    async fn find_thread(&self, board: &BoardName, id: &ThreadId)
        -> anyhow::Result<Option<Thread>>;
    async fn mark_thread_reported(&self, board: &BoardName, id: &ThreadId)
        -> anyhow::Result<bool>;
    /// Removes the thread and its replies when `delete_password` matches.
    async fn delete_thread(
        &self,
        board: &BoardName,
        id: &ThreadId,
        delete_password: &str,
    ) -> anyhow::Result<bool>;

    // Reply Operations

    /// Replies of the given threads in insertion order.
    async fn replies_for(&self, board: &BoardName, threads: &[ThreadId])
        -> anyhow::Result<Vec<Reply>>;
    /// Appends the reply and bumps its thread to at least `reply.created_on`.
    /// Returns `false` when the thread does not exist on the board.
    async fn insert_reply(&self, board: &BoardName, reply: Reply) -> anyhow::Result<bool>;
    async fn mark_reply_reported(
        &self,
        board: &BoardName,
        thread: &ThreadId,
        reply: &ReplyId,
    ) -> anyhow::Result<bool>;
    /// Replaces the reply text when `delete_password` matches.
    async fn overwrite_reply_text(
        &self,
        board: &BoardName,
        thread: &ThreadId,
        reply: &ReplyId,
        delete_password: &str,
        text: &str,
    ) -> anyhow::Result<bool>;
}
