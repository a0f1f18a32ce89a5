//! Location (query string) reflection
//!
//! The session writes the effective query into the location after every
//! user-driven change and reads it once at startup. It is a projection of the
//! controller state, never a second source of truth.

use std::sync::{Arc, Mutex};

/// Where the shareable query string lives
///
/// Values are search strings without the leading `?`.
pub trait LocationSink: Send + Sync {
    /// Current search string
    fn current(&self) -> String;

    /// Rewrite the current entry without growing the history
    fn replace(&self, search: &str);
}

fn normalize(search: &str) -> String {
    search.strip_prefix('?').unwrap_or(search).to_string()
}

#[derive(Debug)]
struct HistoryState {
    entries: Vec<String>,
    index: usize,
}

/// Browser-like history kept in memory
///
/// Clones share the same history, so a test can keep one handle while the
/// session owns another.
#[derive(Debug, Clone)]
pub struct InMemoryHistory {
    state: Arc<Mutex<HistoryState>>,
}

impl InMemoryHistory {
    pub fn new(initial: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(HistoryState {
                entries: vec![normalize(initial)],
                index: 0,
            })),
        }
    }

    /// Navigate to a new entry, dropping any forward entries
    pub fn push(&self, search: &str) {
        if let Ok(mut state) = self.state.lock() {
            let keep = state.index + 1;
            state.entries.truncate(keep);
            state.entries.push(normalize(search));
            state.index = keep;
        }
    }

    /// Step back; returns the new current search string
    pub fn back(&self) -> Option<String> {
        let mut state = self.state.lock().ok()?;
        if state.index == 0 {
            return None;
        }
        state.index -= 1;
        state.entries.get(state.index).cloned()
    }

    /// Step forward; returns the new current search string
    pub fn forward(&self) -> Option<String> {
        let mut state = self.state.lock().ok()?;
        if state.index + 1 >= state.entries.len() {
            return None;
        }
        state.index += 1;
        state.entries.get(state.index).cloned()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new("")
    }
}

impl LocationSink for InMemoryHistory {
    fn current(&self) -> String {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.entries.get(s.index).cloned())
            .unwrap_or_default()
    }

    fn replace(&self, search: &str) {
        if let Ok(mut state) = self.state.lock() {
            let index = state.index;
            if let Some(entry) = state.entries.get_mut(index) {
                *entry = normalize(search);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_does_not_grow_history() {
        let history = InMemoryHistory::new("?_sort=name");
        history.replace("_sort=clicks&_order=desc");
        history.replace("?_sort=name&cashback_enabled=1");
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), "_sort=name&cashback_enabled=1");
    }

    #[test]
    fn test_push_back_forward() {
        let history = InMemoryHistory::new("a=1");
        history.push("a=2");
        history.push("a=3");
        assert_eq!(history.back().as_deref(), Some("a=2"));
        assert_eq!(history.back().as_deref(), Some("a=1"));
        assert_eq!(history.back(), None);
        assert_eq!(history.forward().as_deref(), Some("a=2"));

        // Pushing drops the forward entry.
        history.push("a=9");
        assert_eq!(history.forward(), None);
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), "a=9");
    }
}
