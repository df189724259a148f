//! Visibility reconciliation for the chat-history view
//!
//! The session owns the List Cache and the Override Store and is their
//! only mutator. Rendering resolves each chat's displayed visibility
//! with a fixed precedence: a pending override wins while a write is in
//! flight, a loaded cache page is otherwise trusted as latest confirmed
//! truth, and a chat in neither falls back to private.
//!
//! Session state lives behind a mutex whose guard is never held across a
//! suspension point, so all mutation happens between awaits on one
//! logical thread of control.

use crate::client::cache::ListCache;
use crate::client::overrides::{OverrideStore, Resolution, WriteOutcome};
use crate::client::ChatBackend;
use crate::error::Result;
use crate::pagination::{ChatPage, PageParams, PaginationKey};
use crate::storage::Visibility;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// A transient, dismissible notice surfaced to the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// The chat the notice concerns
    pub chat_id: String,
    /// Human-readable description of what went wrong
    pub message: String,
}

#[derive(Default)]
struct SessionState {
    cache: ListCache,
    overrides: OverrideStore,
    notifications: Vec<Notification>,
}

/// Client session for one authenticated owner's chat-history view
///
/// Created per portal session and torn down on logout; nothing in here
/// is persisted. The backend seam carries the owner binding, so the
/// session never sends owner ids over the wire.
pub struct ChatListSession {
    owner_id: String,
    backend: Arc<dyn ChatBackend>,
    state: Mutex<SessionState>,
}

impl ChatListSession {
    /// Create a session over the given backend
    pub fn new(owner_id: impl Into<String>, backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            owner_id: owner_id.into(),
            backend,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Load a page for display
    ///
    /// Serves from the List Cache when the exact parameters have been
    /// fetched before; otherwise fetches from the backend and populates
    /// the cache. Pending overrides are overlaid onto the returned page,
    /// so the caller always sees the optimistic state.
    pub async fn load_page(&self, params: &PageParams) -> Result<ChatPage> {
        let key = PaginationKey::new(self.owner_id.clone(), params);

        {
            let state = self.state.lock().unwrap();
            if let Some(entry) = state.cache.get(&key) {
                return Ok(overlay(&state.overrides, &entry.page));
            }
        }

        let page = self.backend.fetch_page(params).await?;

        let mut state = self.state.lock().unwrap();
        // The fetched page is the server's current answer: any override
        // it already agrees with has been absorbed and can be dropped.
        for chat in &page.chats {
            state.overrides.clear_matching(&chat.id, chat.visibility);
        }
        state.cache.put(key, page.clone());
        Ok(overlay(&state.overrides, &page))
    }

    /// Resolve the visibility the UI should display for a chat
    pub fn displayed_visibility(&self, chat_id: &str) -> Visibility {
        let state = self.state.lock().unwrap();
        displayed_locked(&state, chat_id)
    }

    /// Whether a visibility edit for the chat is still awaiting the server
    pub fn has_pending_edit(&self, chat_id: &str) -> bool {
        self.state.lock().unwrap().overrides.get(chat_id).is_some()
    }

    /// Change a chat's visibility, optimistically
    ///
    /// The new value is displayed immediately; the persistent write runs
    /// asynchronously. On success the override is confirmed and removed.
    /// On failure the previously displayed value is restored, a failure
    /// notification is recorded exactly once, and the error is returned
    /// so the caller may offer a retry.
    ///
    /// If a newer edit for the same chat supersedes this one before its
    /// response arrives, the response is discarded: only the write ticket
    /// matching the chat's current sequence number may mutate state.
    pub async fn set_visibility(&self, chat_id: &str, visibility: Visibility) -> Result<()> {
        let (seq, previous) = {
            let mut state = self.state.lock().unwrap();
            let previous = displayed_locked(&state, chat_id);
            let seq = state.overrides.set(chat_id, visibility);
            // Drop cache entries still exposing the old value for this
            // chat; membership and ordering are stable under visibility
            // edits, so everything else stays cached.
            state.cache.invalidate(|_, entry| {
                entry
                    .page
                    .chats
                    .iter()
                    .any(|c| c.id == chat_id && c.visibility != visibility)
            });
            (seq, previous)
        };

        debug!("visibility write issued: chat={} seq={}", chat_id, seq);
        let outcome = self.backend.update_visibility(chat_id, visibility).await;

        let mut state = self.state.lock().unwrap();
        match outcome {
            Ok(()) => {
                if state.overrides.resolve(chat_id, seq, WriteOutcome::Confirmed)
                    == Resolution::Stale
                {
                    debug!("discarding stale write confirmation: chat={}", chat_id);
                }
                Ok(())
            }
            Err(err) => {
                if state.overrides.resolve(chat_id, seq, WriteOutcome::Failed)
                    == Resolution::Applied
                {
                    warn!("visibility write failed: chat={} err={}", chat_id, err);
                    state.overrides.set(chat_id, previous);
                    state.notifications.push(Notification {
                        chat_id: chat_id.to_string(),
                        message: format!("Could not update visibility: {}", err),
                    });
                } else {
                    debug!("discarding stale write failure: chat={}", chat_id);
                }
                Err(err)
            }
        }
    }

    /// Drain accumulated failure notifications
    pub fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut self.state.lock().unwrap().notifications)
    }

    /// Drop all session state (logout)
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.cache.clear();
        state.overrides.clear();
        state.notifications.clear();
    }
}

fn displayed_locked(state: &SessionState, chat_id: &str) -> Visibility {
    if let Some(entry) = state.overrides.get(chat_id) {
        return entry.visibility;
    }

    for (_, cached) in state.cache.iter() {
        if let Some(chat) = cached.page.chats.iter().find(|c| c.id == chat_id) {
            return chat.visibility;
        }
    }

    Visibility::Private
}

fn overlay(overrides: &OverrideStore, page: &ChatPage) -> ChatPage {
    let mut rendered = page.clone();
    for chat in &mut rendered.chats {
        if let Some(entry) = overrides.get(&chat.id) {
            chat.visibility = entry.visibility;
        }
    }
    rendered
}
