//! Optimistic visibility overrides awaiting server confirmation
//!
//! Each entry records an edit the user has already seen applied locally
//! but the server has not yet acknowledged. Entries carry a monotonic
//! sequence number; a write response may only mutate state while its
//! sequence number is still the entry's current one, so an out-of-order
//! network response can never clobber a newer edit.
//!
//! Entries live only in memory and are owned exclusively by the
//! reconciliation service.

use crate::storage::Visibility;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Status of an override entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideStatus {
    /// The optimistic value is displayed; the server write is in flight
    Pending,
    /// The server acknowledged the write (entry is removed on resolution)
    Confirmed,
    /// The server rejected the write (entry is removed after rollback)
    Failed,
}

/// Outcome reported by the server for a visibility write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write was persisted
    Confirmed,
    /// The write failed and the optimistic value must be rolled back
    Failed,
}

/// Result of applying a write outcome against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The outcome matched the entry's current sequence number and was applied
    Applied,
    /// The outcome was superseded by a newer edit and was discarded
    Stale,
    /// No entry exists for the chat id
    Missing,
}

/// An optimistic, not-yet-confirmed visibility edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideEntry {
    /// The chat the edit applies to
    pub chat_id: String,
    /// The optimistic visibility value
    pub visibility: Visibility,
    /// When the edit was issued
    pub issued_at: DateTime<Utc>,
    /// Sequence number guarding against out-of-order responses
    pub seq: u64,
    /// Current lifecycle status
    pub status: OverrideStatus,
}

/// Store of pending visibility overrides, keyed by chat id
#[derive(Debug, Default)]
pub struct OverrideStore {
    entries: HashMap<String, OverrideEntry>,
    next_seq: u64,
}

impl OverrideStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a pending entry with a fresh `issued_at`
    ///
    /// Returns the entry's sequence number; the caller keeps it as the
    /// write ticket and presents it back in [`resolve`](Self::resolve).
    pub fn set(&mut self, chat_id: &str, visibility: Visibility) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;

        self.entries.insert(
            chat_id.to_string(),
            OverrideEntry {
                chat_id: chat_id.to_string(),
                visibility,
                issued_at: Utc::now(),
                seq,
                status: OverrideStatus::Pending,
            },
        );

        seq
    }

    /// Look up the entry for a chat id
    pub fn get(&self, chat_id: &str) -> Option<&OverrideEntry> {
        self.entries.get(chat_id)
    }

    /// Apply a write outcome to the entry for `chat_id`
    ///
    /// The outcome is applied only if `seq` matches the entry's current
    /// sequence number; otherwise the response is stale and is discarded
    /// without mutating state. An applied outcome removes the entry: on
    /// `Confirmed` the List Cache becomes the source of truth again, and
    /// on `Failed` the caller restores the previously displayed value.
    pub fn resolve(&mut self, chat_id: &str, seq: u64, outcome: WriteOutcome) -> Resolution {
        let entry = match self.entries.get_mut(chat_id) {
            Some(entry) => entry,
            None => return Resolution::Missing,
        };

        if entry.seq != seq {
            return Resolution::Stale;
        }

        entry.status = match outcome {
            WriteOutcome::Confirmed => OverrideStatus::Confirmed,
            WriteOutcome::Failed => OverrideStatus::Failed,
        };
        self.entries.remove(chat_id);

        Resolution::Applied
    }

    /// Remove the entry for `chat_id` if it holds exactly `visibility`
    ///
    /// Called when a freshly fetched page reports a value for the chat:
    /// an override matching the server's answer has been absorbed into
    /// the List Cache and is no longer needed.
    pub fn clear_matching(&mut self, chat_id: &str, visibility: Visibility) -> bool {
        match self.entries.get(chat_id) {
            Some(entry) if entry.visibility == visibility => {
                self.entries.remove(chat_id);
                true
            }
            _ => false,
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything (session teardown)
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
