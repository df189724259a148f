use crate::error::{BackchatError, Result};
use crate::pagination::{ChatPage, PageParams};
use anyhow::Context;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use ulid::Ulid;

pub mod types;
pub use types::{Chat, NewChat, Visibility};

/// Storage backend for the chat history
///
/// Chats are kept in a single SQLite table ordered by `(created_at, id)`
/// descending per owner. `created_at` is stored as unix microseconds so
/// that ordering comparisons in SQL are exact; RFC-3339 text would not
/// compare chronologically once fractional-second widths differ.
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Create a new storage instance
    ///
    /// Initializes the database file in the user's data directory.
    pub fn new() -> Result<Self> {
        // Allow override of the chat DB path via environment variable.
        // This makes it easy to point the binary at a test DB or alternate
        // file without changing the user's application data dir.
        if let Ok(override_path) = std::env::var("BACKCHAT_HISTORY_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "xbcsmith", "backchat")
            .ok_or_else(|| BackchatError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| BackchatError::Storage(e.to_string()))?;

        let db_path = data_dir.join("chats.db");
        let storage = Self { db_path };

        storage.init()?;

        Ok(storage)
    }

    /// Create a new storage instance that uses the specified database path.
    ///
    /// This is primarily useful for tests where the default application data
    /// directory is not desirable (for example, using a temporary directory).
    ///
    /// # Examples
    ///
    /// ```
    /// use backchat::storage::SqliteStorage;
    ///
    /// let storage = SqliteStorage::new_with_path("/tmp/test_chats.db").unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        // Ensure parent directory exists so opening the DB file succeeds.
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| BackchatError::Storage(e.to_string()))?;
        }

        let storage = Self { db_path };
        storage.init()?;
        Ok(storage)
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chats (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                visibility TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| BackchatError::Storage(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_chats_owner_recency
             ON chats (owner_id, created_at DESC, id DESC)",
            [],
        )
        .context("Failed to create index")
        .map_err(|e| BackchatError::Storage(e.to_string()))?;

        Ok(())
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| BackchatError::Storage(e.to_string()))?;
        Ok(conn)
    }

    /// Create a new chat owned by the given owner
    ///
    /// The chat id is a fresh ULID; `created_at` is the current time.
    pub fn create_chat(&self, new: &NewChat) -> Result<Chat> {
        let chat = Chat {
            id: Ulid::new().to_string(),
            owner_id: new.owner_id.clone(),
            title: new.title.clone(),
            visibility: new.visibility,
            created_at: Utc::now(),
        };

        self.insert_chat(&chat)?;
        Ok(chat)
    }

    /// Insert a fully-formed chat row
    ///
    /// Used by [`create_chat`](Self::create_chat) and by tests that need
    /// control over ids and timestamps.
    pub fn insert_chat(&self, chat: &Chat) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "INSERT INTO chats (id, owner_id, title, visibility, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                chat.id,
                chat.owner_id,
                chat.title,
                chat.visibility.as_str(),
                chat.created_at.timestamp_micros(),
            ],
        )
        .context("Failed to insert chat")
        .map_err(|e| BackchatError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Load a chat by id, regardless of owner
    pub fn get_chat(&self, id: &str) -> Result<Option<Chat>> {
        let conn = self.open()?;

        let row = conn
            .query_row(
                "SELECT id, owner_id, title, visibility, created_at
                 FROM chats WHERE id = ?1",
                params![id],
                Self::read_row,
            )
            .optional()
            .context("Failed to query chat")
            .map_err(|e| BackchatError::Storage(e.to_string()))?;

        row.map(Self::into_chat).transpose()
    }

    /// Load a chat by id, requiring it to belong to the given owner
    ///
    /// # Errors
    ///
    /// Returns `BackchatError::NotFound` if the chat does not exist or is
    /// owned by someone else. The two cases are deliberately
    /// indistinguishable to the caller.
    pub fn get_owned_chat(&self, owner_id: &str, id: &str) -> Result<Chat> {
        match self.get_chat(id)? {
            Some(chat) if chat.owner_id == owner_id => Ok(chat),
            _ => Err(BackchatError::NotFound(format!("chat {}", id)).into()),
        }
    }

    /// Answer a page query against an owner's chat history
    ///
    /// This is the pagination query engine: it resolves the cursor (if any)
    /// to its `(created_at, id)` anchor, fetches `limit + 1` rows strictly
    /// beyond the anchor in the requested direction, and uses the extra row
    /// to compute `has_more`. The returned page is always recency-descending
    /// regardless of fetch direction. No side effects; deterministic given
    /// store state.
    ///
    /// # Errors
    ///
    /// Returns `BackchatError::NotFound` if a cursor references a chat that
    /// does not exist or is not owned by `owner_id`.
    pub fn list_page(&self, owner_id: &str, page: &PageParams) -> Result<ChatPage> {
        let conn = self.open()?;
        let fetch = page.limit() + 1;

        let mut chats = if let Some(anchor_id) = page.starting_after() {
            let (anchor_at, anchor_id) = self.resolve_anchor(&conn, owner_id, anchor_id)?;
            self.query_page(
                &conn,
                "SELECT id, owner_id, title, visibility, created_at FROM chats
                 WHERE owner_id = ?1
                   AND (created_at < ?2 OR (created_at = ?2 AND id < ?3))
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?4",
                params![owner_id, anchor_at, anchor_id, fetch as i64],
            )?
        } else if let Some(anchor_id) = page.ending_before() {
            // Rows strictly before the anchor in display order are newer,
            // so fetch ascending and reverse below.
            let (anchor_at, anchor_id) = self.resolve_anchor(&conn, owner_id, anchor_id)?;
            self.query_page(
                &conn,
                "SELECT id, owner_id, title, visibility, created_at FROM chats
                 WHERE owner_id = ?1
                   AND (created_at > ?2 OR (created_at = ?2 AND id > ?3))
                 ORDER BY created_at ASC, id ASC
                 LIMIT ?4",
                params![owner_id, anchor_at, anchor_id, fetch as i64],
            )?
        } else {
            self.query_page(
                &conn,
                "SELECT id, owner_id, title, visibility, created_at FROM chats
                 WHERE owner_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2",
                params![owner_id, fetch as i64],
            )?
        };

        let has_more = chats.len() > page.limit();
        chats.truncate(page.limit());

        if page.ending_before().is_some() {
            chats.reverse();
        }

        Ok(ChatPage { chats, has_more })
    }

    /// Update a chat's visibility
    ///
    /// # Errors
    ///
    /// Returns `BackchatError::NotFound` if the chat does not exist or is
    /// not owned by `owner_id`.
    pub fn update_visibility(
        &self,
        owner_id: &str,
        chat_id: &str,
        visibility: Visibility,
    ) -> Result<()> {
        let conn = self.open()?;

        let affected = conn
            .execute(
                "UPDATE chats SET visibility = ?1 WHERE id = ?2 AND owner_id = ?3",
                params![visibility.as_str(), chat_id, owner_id],
            )
            .context("Failed to update visibility")
            .map_err(|e| BackchatError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(BackchatError::NotFound(format!("chat {}", chat_id)).into());
        }

        Ok(())
    }

    /// Delete a chat
    ///
    /// # Errors
    ///
    /// Returns `BackchatError::NotFound` if the chat does not exist or is
    /// not owned by `owner_id`.
    pub fn delete_chat(&self, owner_id: &str, chat_id: &str) -> Result<()> {
        let conn = self.open()?;

        let affected = conn
            .execute(
                "DELETE FROM chats WHERE id = ?1 AND owner_id = ?2",
                params![chat_id, owner_id],
            )
            .context("Failed to delete chat")
            .map_err(|e| BackchatError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(BackchatError::NotFound(format!("chat {}", chat_id)).into());
        }

        Ok(())
    }

    /// Resolve a cursor's chat id to its `(created_at, id)` anchor
    fn resolve_anchor(
        &self,
        conn: &Connection,
        owner_id: &str,
        chat_id: &str,
    ) -> Result<(i64, String)> {
        let row = conn
            .query_row(
                "SELECT created_at, id FROM chats WHERE id = ?1 AND owner_id = ?2",
                params![chat_id, owner_id],
                |row| {
                    let created_at: i64 = row.get(0)?;
                    let id: String = row.get(1)?;
                    Ok((created_at, id))
                },
            )
            .optional()
            .context("Failed to resolve cursor")
            .map_err(|e| BackchatError::Storage(e.to_string()))?;

        row.ok_or_else(|| {
            BackchatError::NotFound(format!("cursor references unknown chat {}", chat_id)).into()
        })
    }

    fn query_page(
        &self,
        conn: &Connection,
        sql: &str,
        sql_params: impl rusqlite::Params,
    ) -> Result<Vec<Chat>> {
        let mut stmt = conn
            .prepare(sql)
            .context("Failed to prepare statement")
            .map_err(|e| BackchatError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map(sql_params, Self::read_row)
            .context("Failed to query chats")
            .map_err(|e| BackchatError::Storage(e.to_string()))?;

        let mut chats = Vec::new();
        for row in rows {
            let raw = row
                .context("Failed to read chat row")
                .map_err(|e| BackchatError::Storage(e.to_string()))?;
            chats.push(Self::into_chat(raw)?);
        }

        Ok(chats)
    }

    fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawChat> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
        ))
    }

    fn into_chat(raw: RawChat) -> Result<Chat> {
        let (id, owner_id, title, visibility, created_at) = raw;

        let visibility = Visibility::parse(&visibility).ok_or_else(|| {
            BackchatError::Storage(format!("invalid visibility value: {}", visibility))
        })?;

        let created_at = DateTime::<Utc>::from_timestamp_micros(created_at).ok_or_else(|| {
            BackchatError::Storage(format!("invalid created_at value: {}", created_at))
        })?;

        Ok(Chat {
            id,
            owner_id,
            title,
            visibility,
            created_at,
        })
    }
}

/// Raw column tuple for a chat row: (id, owner_id, title, visibility, created_at)
type RawChat = (String, String, String, String, i64);
