use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who can see a chat in the portal
///
/// Newly created chats default to `Private` until their owner shares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to anyone with the link
    Public,
    /// Visible only to the owner
    #[default]
    Private,
}

impl Visibility {
    /// Canonical lowercase form, as stored in the database and sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    /// Parse the canonical lowercase form
    ///
    /// Returns `None` for anything other than `"public"` or `"private"`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored chat
///
/// Within one owner's history, chats are totally ordered by
/// `(created_at, id)` descending. The ordering never changes after
/// creation; visibility edits do not re-order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Unique chat identifier (ULID)
    pub id: String,
    /// Owner of the chat (the authenticated creator)
    pub owner_id: String,
    /// User-friendly title (or summary)
    pub title: String,
    /// Current visibility
    pub visibility: Visibility,
    /// When the chat was created
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a chat
#[derive(Debug, Clone)]
pub struct NewChat {
    /// Owner of the new chat
    pub owner_id: String,
    /// Title for the new chat
    pub title: String,
    /// Initial visibility
    pub visibility: Visibility,
}
