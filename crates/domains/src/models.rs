//! # Domain Models
//!
//! These structs represent the core entities of the message board.
//! Stored records (`Thread`, `Reply`) carry the delete password and the
//! report flag and are deliberately not `Serialize`; only the view types
//! leave the process.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::FieldViolation;

/// Text a reply carries after its author deletes it.
pub const REDACTED_TEXT: &str = "[deleted]";

/// Length of every thread and reply identifier (12 random bytes, hex encoded).
pub const ID_LENGTH: usize = 24;

/// Longest accepted board name.
pub const BOARD_NAME_MAX_LENGTH: usize = 32;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn generate() -> Self {
                let bytes: [u8; ID_LENGTH / 2] = rand::random();
                Self(hex::encode(bytes))
            }

            /// Accepts exactly `ID_LENGTH` hexadecimal characters.
            pub fn parse(raw: &str) -> Result<Self, FieldViolation> {
                if raw.len() == ID_LENGTH && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
                    Ok(Self(raw.to_ascii_lowercase()))
                } else {
                    Err(FieldViolation::new(
                        $field,
                        format!("must be {ID_LENGTH} hexadecimal characters"),
                    ))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id!(
    /// Identifies a thread within its board.
    ThreadId,
    "thread_id"
);
opaque_id!(
    /// Identifies a reply; random, so unique across threads as well.
    ReplyId,
    "reply_id"
);

/// Name of a board (e.g. "general"). Boards are created lazily.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BoardName(String);

impl BoardName {
    pub fn parse(raw: &str) -> Result<Self, FieldViolation> {
        let valid_chars = raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if raw.is_empty() || raw.len() > BOARD_NAME_MAX_LENGTH || !valid_chars {
            return Err(FieldViolation::new(
                "board",
                format!(
                    "must be 1-{BOARD_NAME_MAX_LENGTH} characters of letters, digits, '-' or '_'"
                ),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BoardName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A top-level post on a board, as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    pub id: ThreadId,
    pub board: BoardName,
    pub text: String,
    pub created_on: DateTime<Utc>,
    /// The timestamp used for sorting threads by activity
    pub bumped_on: DateTime<Utc>,
    pub reported: bool,
    pub delete_password: String,
}

/// A response attached to a thread, as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub id: ReplyId,
    pub thread_id: ThreadId,
    pub text: String,
    pub created_on: DateTime<Utc>,
    pub reported: bool,
    pub delete_password: String,
}

/// Public shape of a reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyView {
    #[serde(rename = "_id")]
    pub id: ReplyId,
    pub text: String,
    pub created_on: DateTime<Utc>,
}

impl From<Reply> for ReplyView {
    fn from(reply: Reply) -> Self {
        Self {
            id: reply.id,
            text: reply.text,
            created_on: reply.created_on,
        }
    }
}

/// Public shape of a thread: used both for the board listing (reply
/// preview) and the single-thread view (every reply).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadView {
    #[serde(rename = "_id")]
    pub id: ThreadId,
    pub text: String,
    pub created_on: DateTime<Utc>,
    pub bumped_on: DateTime<Utc>,
    pub replies: Vec<ReplyView>,
    /// Total number of replies, before any preview truncation
    pub replycount: usize,
}

impl ThreadView {
    pub fn new(thread: Thread, replies: Vec<ReplyView>, replycount: usize) -> Self {
        Self {
            id: thread.id,
            text: thread.text,
            created_on: thread.created_on,
            bumped_on: thread.bumped_on,
            replies,
            replycount,
        }
    }
}

/// Current time truncated to the millisecond precision the stores persist.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
