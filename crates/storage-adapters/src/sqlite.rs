//! # SqliteThreadStore
//!
//! This module implements the data mapping between the SQLite relational model
//! (`board`, `thread`, `reply`) and the `domains` models.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{BoardName, Reply, ReplyId, Thread, ThreadId, ThreadStore};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::info;

const THREAD_COLUMNS: &str =
    "id, board, text, created_on, bumped_on, reported, delete_password";

#[derive(Debug, Clone)]
pub struct SqliteThreadStore {
    pool: SqlitePool,
}

impl SqliteThreadStore {
    /// Opens (creating if missing) the database at `url`.
    ///
    /// # Developer Note
    /// An in-memory database lives inside a single connection, so memory URLs
    /// get a one-connection pool that never recycles it.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        if url.contains(":memory:") || url.contains("mode=memory") {
            return Self::open_in_memory(url).await;
        }

        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid SQLite URL {url:?}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        Ok(Self { pool })
    }

    /// A private, migrated in-memory database. Used by tests.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let store = Self::open_in_memory("sqlite::memory:").await?;
        store.migrate().await?;
        Ok(store)
    }

    async fn open_in_memory(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid SQLite URL {url:?}"))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory SQLite database")?;

        Ok(Self { pool })
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(millis: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| anyhow!("timestamp out of range: {millis}"))
}

fn row_to_thread(row: &SqliteRow) -> anyhow::Result<Thread> {
    Ok(Thread {
        id: ThreadId::parse(row.try_get::<&str, _>("id")?)
            .map_err(|v| anyhow!("corrupt thread row: {v}"))?,
        board: BoardName::parse(row.try_get::<&str, _>("board")?)
            .map_err(|v| anyhow!("corrupt thread row: {v}"))?,
        text: row.try_get("text")?,
        created_on: from_millis(row.try_get("created_on")?)?,
        bumped_on: from_millis(row.try_get("bumped_on")?)?,
        reported: row.try_get("reported")?,
        delete_password: row.try_get("delete_password")?,
    })
}

fn row_to_reply(row: &SqliteRow) -> anyhow::Result<Reply> {
    Ok(Reply {
        id: ReplyId::parse(row.try_get::<&str, _>("id")?)
            .map_err(|v| anyhow!("corrupt reply row: {v}"))?,
        thread_id: ThreadId::parse(row.try_get::<&str, _>("thread")?)
            .map_err(|v| anyhow!("corrupt reply row: {v}"))?,
        text: row.try_get("text")?,
        created_on: from_millis(row.try_get("created_on")?)?,
        reported: row.try_get("reported")?,
        delete_password: row.try_get("delete_password")?,
    })
}

#[async_trait]
impl ThreadStore for SqliteThreadStore {
    async fn ensure_board(&self, board: &BoardName) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO board (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
            .bind(board.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to create board /{board}/"))?;
        Ok(())
    }

    /// Creates the board (if needed) and the thread in one transaction.
    async fn insert_thread(&self, thread: Thread) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO board (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
            .bind(thread.board.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO thread (id, board, text, created_on, bumped_on, reported, delete_password) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(thread.id.as_str())
        .bind(thread.board.as_str())
        .bind(&thread.text)
        .bind(to_millis(thread.created_on))
        .bind(to_millis(thread.bumped_on))
        .bind(thread.reported)
        .bind(&thread.delete_password)
        .execute(&mut *tx)
        .await
        .context("Failed adding thread")?;

        tx.commit().await?;
        Ok(())
    }

    async fn recent_threads(
        &self,
        board: &BoardName,
        limit: usize,
    ) -> anyhow::Result<Vec<Thread>> {
        let rows = sqlx::query(&format!(
            "SELECT {THREAD_COLUMNS} FROM thread WHERE board = ? \
             ORDER BY bumped_on DESC, rowid DESC LIMIT ?"
        ))
        .bind(board.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("Failed listing threads")?;

        rows.iter().map(row_to_thread).collect()
    }

    async fn find_thread(
        &self,
        board: &BoardName,
        id: &ThreadId,
    ) -> anyhow::Result<Option<Thread>> {
        let row = sqlx::query(&format!(
            "SELECT {THREAD_COLUMNS} FROM thread WHERE id = ? AND board = ?"
        ))
        .bind(id.as_str())
        .bind(board.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed loading thread")?;

        row.as_ref().map(row_to_thread).transpose()
    }

    async fn mark_thread_reported(&self, board: &BoardName, id: &ThreadId) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE thread SET reported = TRUE WHERE id = ? AND board = ?")
            .bind(id.as_str())
            .bind(board.as_str())
            .execute(&self.pool)
            .await
            .context("Failed reporting thread")?;
        Ok(result.rows_affected() > 0)
    }

    /// Replies go with the thread through `ON DELETE CASCADE`.
    async fn delete_thread(
        &self,
        board: &BoardName,
        id: &ThreadId,
        delete_password: &str,
    ) -> anyhow::Result<bool> {
        let result =
            sqlx::query("DELETE FROM thread WHERE id = ? AND board = ? AND delete_password = ?")
                .bind(id.as_str())
                .bind(board.as_str())
                .bind(delete_password)
                .execute(&self.pool)
                .await
                .context("Failed deleting thread")?;
        Ok(result.rows_affected() > 0)
    }

    async fn replies_for(
        &self,
        board: &BoardName,
        threads: &[ThreadId],
    ) -> anyhow::Result<Vec<Reply>> {
        if threads.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT id, thread, text, created_on, reported, delete_password FROM reply WHERE board = ",
        );
        query.push_bind(board.as_str());
        query.push(" AND thread IN (");
        let mut ids = query.separated(", ");
        for id in threads {
            ids.push_bind(id.as_str());
        }
        ids.push_unseparated(")");
        query.push(" ORDER BY created_on ASC, rowid ASC");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed loading replies")?;

        rows.iter().map(row_to_reply).collect()
    }

    /// Bumps the thread and appends the reply atomically.
    ///
    /// # Developer Note
    /// The bump runs first: a missing thread shows up as zero affected rows
    /// and nothing is written. `MAX` keeps `bumped_on` from moving backwards
    /// if the wall clock does.
    async fn insert_reply(&self, board: &BoardName, reply: Reply) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query(
            "UPDATE thread SET bumped_on = MAX(bumped_on, ?) WHERE id = ? AND board = ?",
        )
        .bind(to_millis(reply.created_on))
        .bind(reply.thread_id.as_str())
        .bind(board.as_str())
        .execute(&mut *tx)
        .await
        .context("Failed bumping thread")?
        .rows_affected();

        if bumped == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO reply (id, thread, board, text, created_on, reported, delete_password) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(reply.id.as_str())
        .bind(reply.thread_id.as_str())
        .bind(board.as_str())
        .bind(&reply.text)
        .bind(to_millis(reply.created_on))
        .bind(reply.reported)
        .bind(&reply.delete_password)
        .execute(&mut *tx)
        .await
        .context("Failed adding reply")?;

        tx.commit().await?;
        Ok(true)
    }

    async fn mark_reply_reported(
        &self,
        board: &BoardName,
        thread: &ThreadId,
        reply: &ReplyId,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE reply SET reported = TRUE WHERE id = ? AND thread = ? AND board = ?",
        )
        .bind(reply.as_str())
        .bind(thread.as_str())
        .bind(board.as_str())
        .execute(&self.pool)
        .await
        .context("Failed reporting reply")?;
        Ok(result.rows_affected() > 0)
    }

    async fn overwrite_reply_text(
        &self,
        board: &BoardName,
        thread: &ThreadId,
        reply: &ReplyId,
        delete_password: &str,
        text: &str,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE reply SET text = ? \
             WHERE id = ? AND thread = ? AND board = ? AND delete_password = ?",
        )
        .bind(text)
        .bind(reply.as_str())
        .bind(thread.as_str())
        .bind(board.as_str())
        .bind(delete_password)
        .execute(&self.pool)
        .await
        .context("Failed redacting reply")?;
        Ok(result.rows_affected() > 0)
    }
}
