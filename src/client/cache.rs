//! Client-side cache of fetched history pages
//!
//! Pages are keyed by the exact query parameters used to fetch them, so
//! concurrent fetches for different parameters can never corrupt each
//! other's entries; the last writer for a given key wins, which is safe
//! because a page is immutable data computed from those parameters.
//!
//! There is no TTL. Invalidation is event-driven: whenever an attribute
//! the list depends on changes, the mutation site drops exactly the
//! entries made stale by the change.

use crate::pagination::{ChatPage, PaginationKey};
use chrono::{DateTime, Utc};
use metrics::{counter, increment_counter};
use std::collections::HashMap;

/// A cached page plus the time it was fetched
#[derive(Debug, Clone)]
pub struct CachedPage {
    /// The page as the server returned it (no overrides applied)
    pub page: ChatPage,
    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
}

/// Cache of fetched history pages, keyed by [`PaginationKey`]
#[derive(Debug, Default)]
pub struct ListCache {
    entries: HashMap<PaginationKey, CachedPage>,
}

impl ListCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cached page for a key
    ///
    /// Returns `None` on a miss. Hit/miss counts are reported through the
    /// `metrics` facade as `list_cache_hits_total` / `list_cache_misses_total`.
    pub fn get(&self, key: &PaginationKey) -> Option<&CachedPage> {
        match self.entries.get(key) {
            Some(entry) => {
                increment_counter!("list_cache_hits_total");
                Some(entry)
            }
            None => {
                increment_counter!("list_cache_misses_total");
                None
            }
        }
    }

    /// Store or overwrite the page for a key
    pub fn put(&mut self, key: PaginationKey, page: ChatPage) {
        self.entries.insert(
            key,
            CachedPage {
                page,
                fetched_at: Utc::now(),
            },
        );
    }

    /// Drop every entry matching the predicate
    ///
    /// Returns the number of entries removed.
    pub fn invalidate<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&PaginationKey, &CachedPage) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|key, entry| !predicate(key, entry));
        let removed = before - self.entries.len();

        if removed > 0 {
            counter!("list_cache_invalidations_total", removed as u64);
        }

        removed
    }

    /// Iterate over all cached entries
    pub fn iter(&self) -> impl Iterator<Item = (&PaginationKey, &CachedPage)> {
        self.entries.iter()
    }

    /// Number of cached pages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no pages
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything (session teardown)
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PageParams;
    use crate::storage::{Chat, Visibility};

    fn chat(id: &str, visibility: Visibility) -> Chat {
        Chat {
            id: id.to_string(),
            owner_id: "alice".to_string(),
            title: "chat".to_string(),
            visibility,
            created_at: Utc::now(),
        }
    }

    fn page_of(chats: Vec<Chat>) -> ChatPage {
        ChatPage {
            chats,
            has_more: false,
        }
    }

    #[test]
    fn test_get_returns_miss_for_unknown_key() {
        let cache = ListCache::new();
        let key = PaginationKey::new("alice", &PageParams::first(10));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_put_then_get_round_trip() {
        let mut cache = ListCache::new();
        let key = PaginationKey::new("alice", &PageParams::first(10));
        let page = page_of(vec![chat("01ARZ3NDEKTSV4RRFFQ69G5FAV", Visibility::Private)]);

        cache.put(key.clone(), page.clone());

        let entry = cache.get(&key).expect("expected a hit");
        assert_eq!(entry.page, page);
    }

    #[test]
    fn test_put_overwrites_existing_entry() {
        let mut cache = ListCache::new();
        let key = PaginationKey::new("alice", &PageParams::first(10));

        cache.put(key.clone(), page_of(vec![]));
        let updated = page_of(vec![chat("01ARZ3NDEKTSV4RRFFQ69G5FAV", Visibility::Public)]);
        cache.put(key.clone(), updated.clone());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key).unwrap().page, updated);
    }

    #[test]
    fn test_distinct_params_get_distinct_entries() {
        let mut cache = ListCache::new();
        let small = PaginationKey::new("alice", &PageParams::first(10));
        let large = PaginationKey::new("alice", &PageParams::first(20));

        cache.put(small.clone(), page_of(vec![]));
        cache.put(
            large.clone(),
            page_of(vec![chat("01ARZ3NDEKTSV4RRFFQ69G5FAV", Visibility::Private)]),
        );

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&small).unwrap().page.chats.is_empty());
        assert_eq!(cache.get(&large).unwrap().page.chats.len(), 1);
    }

    #[test]
    fn test_invalidate_drops_only_matching_entries() {
        let mut cache = ListCache::new();
        let stale_key = PaginationKey::new("alice", &PageParams::first(10));
        let fresh_key = PaginationKey::new("alice", &PageParams::first(20));

        cache.put(
            stale_key.clone(),
            page_of(vec![chat("01ARZ3NDEKTSV4RRFFQ69G5FAV", Visibility::Private)]),
        );
        cache.put(
            fresh_key.clone(),
            page_of(vec![chat("01BX5ZZKBKACTAV9WEVGEMMVRZ", Visibility::Private)]),
        );

        let removed = cache.invalidate(|_, entry| {
            entry
                .page
                .chats
                .iter()
                .any(|c| c.id == "01ARZ3NDEKTSV4RRFFQ69G5FAV")
        });

        assert_eq!(removed, 1);
        assert!(cache.get(&stale_key).is_none());
        assert!(cache.get(&fresh_key).is_some());
    }

    #[test]
    fn test_clear_empties_cache() {
        let mut cache = ListCache::new();
        cache.put(PaginationKey::new("alice", &PageParams::first(10)), page_of(vec![]));

        cache.clear();

        assert!(cache.is_empty());
    }
}
