//! Pagination parameters, cache keys, and page types
//!
//! Raw query input is parsed into a validated [`PageParams`] at the
//! boundary; invalid combinations fail fast as `BadRequest` before they
//! can reach the query engine. [`PaginationKey`] is the exact set of
//! parameters that identifies one cached page.

use crate::cursor;
use crate::error::{BackchatError, Result};
use crate::storage::Chat;
use serde::{Deserialize, Serialize};

/// Page size used when the caller does not supply a limit
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Hard ceiling on the page size; larger requests are clamped, not rejected
pub const MAX_PAGE_LIMIT: usize = 100;

/// Validated pagination parameters
///
/// Cursors are decoded to chat ids during construction, so holders of a
/// `PageParams` know the parameters are well-formed. `starting_after`
/// and `ending_before` are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageParams {
    limit: usize,
    starting_after: Option<String>,
    ending_before: Option<String>,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            starting_after: None,
            ending_before: None,
        }
    }
}

impl PageParams {
    /// Build parameters from raw query input
    ///
    /// # Arguments
    ///
    /// * `limit` - Requested page size; `None` means [`DEFAULT_PAGE_LIMIT`]
    /// * `starting_after` - Cursor to page away from the head of the list
    /// * `ending_before` - Cursor to page back toward the head of the list
    /// * `max_limit` - Ceiling to clamp the requested size to
    ///
    /// # Errors
    ///
    /// Returns `BackchatError::BadRequest` when both cursors are supplied,
    /// when the limit is zero, or when a cursor is malformed.
    pub fn from_query(
        limit: Option<usize>,
        starting_after: Option<&str>,
        ending_before: Option<&str>,
        max_limit: usize,
    ) -> Result<Self> {
        if starting_after.is_some() && ending_before.is_some() {
            return Err(BackchatError::BadRequest(
                "starting_after and ending_before are mutually exclusive".to_string(),
            )
            .into());
        }

        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit == 0 {
            return Err(BackchatError::BadRequest("limit must be positive".to_string()).into());
        }

        let starting_after = starting_after.map(cursor::decode).transpose()?;
        let ending_before = ending_before.map(cursor::decode).transpose()?;

        Ok(Self {
            limit: limit.min(max_limit),
            starting_after,
            ending_before,
        })
    }

    /// Parameters for the first page with the given limit
    pub fn first(limit: usize) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            starting_after: None,
            ending_before: None,
        }
    }

    /// Parameters for the page following the given chat, same limit
    pub fn after(chat: &Chat, limit: usize) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            starting_after: Some(chat.id.clone()),
            ending_before: None,
        }
    }

    /// Parameters for the page preceding the given chat, same limit
    pub fn before(chat: &Chat, limit: usize) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            starting_after: None,
            ending_before: Some(chat.id.clone()),
        }
    }

    /// Maximum number of chats the page may contain
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Decoded anchor id for forward pagination, if any
    pub fn starting_after(&self) -> Option<&str> {
        self.starting_after.as_deref()
    }

    /// Decoded anchor id for backward pagination, if any
    pub fn ending_before(&self) -> Option<&str> {
        self.ending_before.as_deref()
    }
}

/// The full set of parameters that uniquely identifies one cached page
///
/// Two keys are equal iff all fields match, which is what makes the List
/// Cache safe under concurrent fetches: distinct queries can never clobber
/// each other's entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaginationKey {
    owner_id: String,
    limit: usize,
    starting_after: Option<String>,
    ending_before: Option<String>,
}

impl PaginationKey {
    /// Build the cache key for an owner's page query
    pub fn new(owner_id: impl Into<String>, params: &PageParams) -> Self {
        Self {
            owner_id: owner_id.into(),
            limit: params.limit,
            starting_after: params.starting_after.clone(),
            ending_before: params.ending_before.clone(),
        }
    }

    /// Owner the page belongs to
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

/// One page of an owner's chat history
///
/// Chats are recency-descending regardless of fetch direction. `has_more`
/// indicates that at least one additional row exists strictly beyond the
/// page in the requested direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPage {
    /// The chats on this page, most recent first
    pub chats: Vec<Chat>,
    /// Whether more rows exist beyond this page in the requested direction
    pub has_more: bool,
}

impl ChatPage {
    /// An empty page with no further rows
    pub fn empty() -> Self {
        Self {
            chats: Vec::new(),
            has_more: false,
        }
    }
}
