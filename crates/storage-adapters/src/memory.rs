//! # MemoryThreadStore
//!
//! In-process `ThreadStore` keeping every board as one nested document.
//! Each operation holds the board's shard lock for its whole duration, which
//! gives the same single-record atomicity a document database offers.

use async_trait::async_trait;
use dashmap::DashMap;
use domains::{BoardName, Reply, ReplyId, Thread, ThreadId, ThreadStore};

#[derive(Debug, Default)]
struct BoardDocument {
    /// Insertion order
    threads: Vec<ThreadDocument>,
}

#[derive(Debug)]
struct ThreadDocument {
    thread: Thread,
    /// Insertion order
    replies: Vec<Reply>,
}

#[derive(Debug, Default)]
pub struct MemoryThreadStore {
    boards: DashMap<String, BoardDocument>,
}

impl MemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the addressed thread, or returns `None` if the board
    /// or thread does not exist.
    fn with_thread<R>(
        &self,
        board: &BoardName,
        id: &ThreadId,
        f: impl FnOnce(&mut ThreadDocument) -> R,
    ) -> Option<R> {
        let mut doc = self.boards.get_mut(board.as_str())?;
        let thread = doc.threads.iter_mut().find(|t| &t.thread.id == id)?;
        Some(f(thread))
    }
}

#[async_trait]
impl ThreadStore for MemoryThreadStore {
    async fn ensure_board(&self, board: &BoardName) -> anyhow::Result<()> {
        self.boards.entry(board.as_str().to_owned()).or_default();
        Ok(())
    }

    async fn insert_thread(&self, thread: Thread) -> anyhow::Result<()> {
        let mut doc = self.boards.entry(thread.board.as_str().to_owned()).or_default();
        if doc.threads.iter().any(|t| t.thread.id == thread.id) {
            anyhow::bail!("thread {} already exists on /{}/", thread.id, thread.board);
        }
        doc.threads.push(ThreadDocument {
            thread,
            replies: Vec::new(),
        });
        Ok(())
    }

    async fn recent_threads(
        &self,
        board: &BoardName,
        limit: usize,
    ) -> anyhow::Result<Vec<Thread>> {
        let Some(doc) = self.boards.get(board.as_str()) else {
            return Ok(Vec::new());
        };
        // Newest insertion first so equal bump times favour the later thread.
        let mut threads: Vec<Thread> = doc.threads.iter().rev().map(|t| t.thread.clone()).collect();
        threads.sort_by(|a, b| b.bumped_on.cmp(&a.bumped_on));
        threads.truncate(limit);
        Ok(threads)
    }

    async fn find_thread(
        &self,
        board: &BoardName,
        id: &ThreadId,
    ) -> anyhow::Result<Option<Thread>> {
        Ok(self.with_thread(board, id, |doc| doc.thread.clone()))
    }

    async fn mark_thread_reported(&self, board: &BoardName, id: &ThreadId) -> anyhow::Result<bool> {
        Ok(self
            .with_thread(board, id, |doc| doc.thread.reported = true)
            .is_some())
    }

    async fn delete_thread(
        &self,
        board: &BoardName,
        id: &ThreadId,
        delete_password: &str,
    ) -> anyhow::Result<bool> {
        let Some(mut doc) = self.boards.get_mut(board.as_str()) else {
            return Ok(false);
        };
        let position = doc
            .threads
            .iter()
            .position(|t| &t.thread.id == id && t.thread.delete_password == delete_password);
        Ok(match position {
            Some(index) => {
                doc.threads.remove(index);
                true
            }
            None => false,
        })
    }

    async fn replies_for(
        &self,
        board: &BoardName,
        threads: &[ThreadId],
    ) -> anyhow::Result<Vec<Reply>> {
        let Some(doc) = self.boards.get(board.as_str()) else {
            return Ok(Vec::new());
        };
        Ok(doc
            .threads
            .iter()
            .filter(|t| threads.contains(&t.thread.id))
            .flat_map(|t| t.replies.iter().cloned())
            .collect())
    }

    async fn insert_reply(&self, board: &BoardName, reply: Reply) -> anyhow::Result<bool> {
        let thread_id = reply.thread_id.clone();
        Ok(self
            .with_thread(board, &thread_id, |doc| {
                doc.thread.bumped_on = doc.thread.bumped_on.max(reply.created_on);
                doc.replies.push(reply);
            })
            .is_some())
    }

    async fn mark_reply_reported(
        &self,
        board: &BoardName,
        thread: &ThreadId,
        reply: &ReplyId,
    ) -> anyhow::Result<bool> {
        Ok(self
            .with_thread(board, thread, |doc| {
                doc.replies
                    .iter_mut()
                    .find(|r| &r.id == reply)
                    .map(|r| r.reported = true)
                    .is_some()
            })
            .unwrap_or(false))
    }

    async fn overwrite_reply_text(
        &self,
        board: &BoardName,
        thread: &ThreadId,
        reply: &ReplyId,
        delete_password: &str,
        text: &str,
    ) -> anyhow::Result<bool> {
        Ok(self
            .with_thread(board, thread, |doc| {
                doc.replies
                    .iter_mut()
                    .find(|r| &r.id == reply && r.delete_password == delete_password)
                    .map(|r| r.text = text.to_owned())
                    .is_some()
            })
            .unwrap_or(false))
    }
}
