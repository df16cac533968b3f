//! Scratchpad repository.
//!
//! # Responsibility
//! - Persist the single freeform note shown next to the calendar.
//!
//! # Invariants
//! - The `scratchpad` table holds exactly one row (`id = 1`).
//! - Saves are last-write-wins; there is no history.

use crate::repo::event_repo::{RepoError, RepoResult};
use crate::repo::table_exists;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

/// The stored freeform note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scratchpad {
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

/// Repository interface for the scratchpad note.
pub trait ScratchpadRepository {
    fn get_scratchpad(&self) -> RepoResult<Scratchpad>;
    /// Replaces the note content and stamps `updated_at` with now.
    fn save_scratchpad(&self, content: &str) -> RepoResult<Scratchpad>;
}

/// SQLite-backed scratchpad repository.
pub struct SqliteScratchpadRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteScratchpadRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if !table_exists(conn, "scratchpad")? {
            return Err(RepoError::MissingRequiredTable("scratchpad"));
        }
        Ok(Self { conn })
    }
}

impl ScratchpadRepository for SqliteScratchpadRepository<'_> {
    fn get_scratchpad(&self) -> RepoResult<Scratchpad> {
        let (content, updated_at_ms): (String, i64) = self.conn.query_row(
            "SELECT content, updated_at_ms FROM scratchpad WHERE id = 1;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let updated_at = DateTime::<Utc>::from_timestamp_millis(updated_at_ms).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid timestamp `{updated_at_ms}` in scratchpad.updated_at_ms"
            ))
        })?;
        Ok(Scratchpad {
            content,
            updated_at,
        })
    }

    fn save_scratchpad(&self, content: &str) -> RepoResult<Scratchpad> {
        let now_ms = Utc::now().timestamp_millis();
        self.conn.execute(
            "INSERT INTO scratchpad (id, content, updated_at_ms)
             VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                content = excluded.content,
                updated_at_ms = excluded.updated_at_ms;",
            params![content, now_ms],
        )?;
        self.get_scratchpad()
    }
}
