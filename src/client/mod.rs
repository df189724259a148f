//! Client-side list state for the portal UI
//!
//! Everything the browser-facing layer needs to render an owner's chat
//! history responsively: a page cache keyed by exact query parameters, an
//! optimistic override store for in-flight visibility edits, the
//! reconciliation service that arbitrates between them, and a debounced
//! existence probe for link validation.
//!
//! The server is reached through the [`ChatBackend`] seam, either
//! in-process ([`LocalBackend`]) or over HTTP ([`HttpBackend`]).

pub mod cache;
pub mod http;
pub mod overrides;
pub mod probe;
pub mod reconcile;

pub use cache::{CachedPage, ListCache};
pub use http::HttpBackend;
pub use overrides::{OverrideEntry, OverrideStatus, OverrideStore, Resolution, WriteOutcome};
pub use probe::{Debouncer, HttpProber, ProbeOutcome, ResourceProber};
pub use reconcile::{ChatListSession, Notification};

use crate::error::Result;
use crate::pagination::{ChatPage, PageParams};
use crate::storage::{SqliteStorage, Visibility};
use async_trait::async_trait;
use std::sync::Arc;

/// Server seam for the client session
///
/// The authenticated owner is bound when the backend is constructed, so
/// every call is implicitly scoped to that owner's history.
///
/// # Examples
///
/// ```no_run
/// use backchat::client::{ChatListSession, LocalBackend};
/// use backchat::storage::SqliteStorage;
/// use std::sync::Arc;
///
/// # fn main() -> backchat::error::Result<()> {
/// let storage = Arc::new(SqliteStorage::new()?);
/// let backend = Arc::new(LocalBackend::new(storage, "alice"));
/// let session = ChatListSession::new("alice", backend);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Fetch one page of the owner's chat history
    ///
    /// # Errors
    ///
    /// Returns `BackchatError::NotFound` if a cursor in `params` no longer
    /// resolves to one of the owner's chats.
    async fn fetch_page(&self, params: &PageParams) -> Result<ChatPage>;

    /// Persist a visibility change for one of the owner's chats
    ///
    /// # Errors
    ///
    /// Returns `BackchatError::NotFound` if the chat does not exist or is
    /// not owned by the caller, and `BackchatError::WriteFailure` when the
    /// write cannot be persisted.
    async fn update_visibility(&self, chat_id: &str, visibility: Visibility) -> Result<()>;
}

/// In-process backend over the persistent chat store
///
/// Used by server-rendered portal pages and by tests; network deployments
/// use [`HttpBackend`] instead.
pub struct LocalBackend {
    storage: Arc<SqliteStorage>,
    owner_id: String,
}

impl LocalBackend {
    /// Bind a backend to an owner over the given store
    pub fn new(storage: Arc<SqliteStorage>, owner_id: impl Into<String>) -> Self {
        Self {
            storage,
            owner_id: owner_id.into(),
        }
    }
}

#[async_trait]
impl ChatBackend for LocalBackend {
    async fn fetch_page(&self, params: &PageParams) -> Result<ChatPage> {
        self.storage.list_page(&self.owner_id, params)
    }

    async fn update_visibility(&self, chat_id: &str, visibility: Visibility) -> Result<()> {
        self.storage
            .update_visibility(&self.owner_id, chat_id, visibility)
    }
}
