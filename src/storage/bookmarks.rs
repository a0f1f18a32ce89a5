//! Bookmarked store identifiers
//!
//! The listing never reads bookmarks; the set only backs the heart toggle on
//! store cards. It is serialized as a JSON array under [`BOOKMARKS_KEY`] by
//! whoever persists it.

use crate::core::store::StoreId;
use indexmap::IndexSet;
use std::sync::{Arc, RwLock};

/// Storage key of the serialized set
pub const BOOKMARKS_KEY: &str = "bookmarkedStores";

/// Process-wide set of bookmarked stores, in bookmarking order
#[derive(Debug, Clone, Default)]
pub struct BookmarkSet {
    ids: Arc<RwLock<IndexSet<StoreId>>>,
}

impl BookmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from the persisted JSON array
    ///
    /// A missing or unreadable value yields an empty set.
    pub fn from_json(json: Option<&str>) -> Self {
        let ids: Vec<StoreId> = json
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default();
        Self {
            ids: Arc::new(RwLock::new(ids.into_iter().collect())),
        }
    }

    pub fn to_json(&self) -> String {
        let ids: Vec<StoreId> = self
            .ids
            .read()
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();
        serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn contains(&self, id: &StoreId) -> bool {
        self.ids.read().map(|ids| ids.contains(id)).unwrap_or(false)
    }

    /// Add or remove `id`; returns whether it is bookmarked afterwards
    pub fn toggle(&self, id: &StoreId) -> bool {
        let Ok(mut ids) = self.ids.write() else {
            return false;
        };
        if ids.shift_remove(id) {
            false
        } else {
            ids.insert(id.clone());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.ids.read().map(|ids| ids.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let bookmarks = BookmarkSet::new();
        let id = StoreId::Number(4);
        assert!(bookmarks.toggle(&id));
        assert!(bookmarks.contains(&id));
        assert!(!bookmarks.toggle(&id));
        assert!(bookmarks.is_empty());
    }

    #[test]
    fn test_json_keeps_order_and_types() {
        let bookmarks = BookmarkSet::from_json(Some(r#"[3, "abc", 1]"#));
        assert_eq!(bookmarks.len(), 3);
        bookmarks.toggle(&StoreId::Number(9));
        assert_eq!(bookmarks.to_json(), r#"[3,"abc",1,9]"#);
    }

    #[test]
    fn test_garbage_json_is_empty() {
        assert!(BookmarkSet::from_json(Some("{oops")).is_empty());
        assert!(BookmarkSet::from_json(None).is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let a = BookmarkSet::new();
        let b = a.clone();
        a.toggle(&StoreId::from("x"));
        assert!(b.contains(&StoreId::from("x")));
    }
}
