//! User-facing filter selection
//!
//! A [`FilterSelection`] is the structured value behind the filter bar. It is
//! immutable: every setter returns a new selection, which the UI hands to the
//! session as a whole.
//!
//! The search box and the letter index are two views of the same field,
//! modelled as one [`NameFilter`], so picking a letter always clears the typed
//! text and typing always clears the letter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Labels of the letter index, in display order
pub const INDEX_LABELS: [&str; 23] = [
    "All", "0-9", "A", "B", "C", "D", "E", "F", "G", "H", "J", "K", "L", "M", "N", "O", "P", "R",
    "T", "V", "W", "X", "Y",
];

/// Anchor selected in the letter index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexLetter {
    /// Names starting with a digit
    Digit,
    /// Names starting with this (uppercase) letter
    Letter(char),
}

impl IndexLetter {
    /// Parse an index label (`"0-9"`, `"A"`, `"b"`)
    ///
    /// `"All"` is not a letter; it is [`NameFilter::None`].
    pub fn from_label(label: &str) -> Option<Self> {
        if label == "0-9" {
            return Some(IndexLetter::Digit);
        }
        let mut chars = label.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                Some(IndexLetter::Letter(c.to_ascii_uppercase()))
            }
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            IndexLetter::Digit => "0-9".to_string(),
            IndexLetter::Letter(c) => c.to_string(),
        }
    }

    /// Starts-with pattern sent as `name_like`
    pub fn pattern(&self) -> String {
        match self {
            IndexLetter::Digit => "^[0-9]".to_string(),
            IndexLetter::Letter(c) => format!("^{}", c),
        }
    }

    /// Inverse of [`IndexLetter::pattern`]
    pub fn from_pattern(pattern: &str) -> Option<Self> {
        if pattern == "^[0-9]" {
            return Some(IndexLetter::Digit);
        }
        pattern.strip_prefix('^').and_then(Self::from_label)
    }
}

/// Name narrowing: nothing, a letter anchor, or a typed substring
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NameFilter {
    #[default]
    None,
    Anchor(IndexLetter),
    Substring(String),
}

impl NameFilter {
    /// Letter index label currently highlighted
    ///
    /// `"All"` when nothing is selected, empty while a search is typed.
    pub fn selected_label(&self) -> String {
        match self {
            NameFilter::None => "All".to_string(),
            NameFilter::Anchor(letter) => letter.label(),
            NameFilter::Substring(_) => String::new(),
        }
    }

    /// Text shown in the search box
    pub fn search_text(&self) -> &str {
        match self {
            NameFilter::Substring(text) => text,
            _ => "",
        }
    }

    /// Value of `name_like`, if any
    pub fn pattern(&self) -> Option<String> {
        match self {
            NameFilter::None => None,
            NameFilter::Anchor(letter) => Some(letter.pattern()),
            NameFilter::Substring(text) if text.is_empty() => None,
            NameFilter::Substring(text) => Some(text.clone()),
        }
    }

    /// Decode a `name_like` value
    pub fn from_pattern(pattern: &str) -> Self {
        if pattern.is_empty() {
            return NameFilter::None;
        }
        match IndexLetter::from_pattern(pattern) {
            Some(letter) => NameFilter::Anchor(letter),
            None => NameFilter::Substring(pattern.to_string()),
        }
    }
}

/// Publication status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    #[default]
    Active,
    ComingSoon,
    Discontinued,
}

impl StoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreStatus::Active => "active",
            StoreStatus::ComingSoon => "coming_soon",
            StoreStatus::Discontinued => "discontinued",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(StoreStatus::Active),
            "coming_soon" => Some(StoreStatus::ComingSoon),
            "discontinued" => Some(StoreStatus::Discontinued),
            _ => None,
        }
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort order of the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Alphabetical,
    Popularity,
    /// Grouped by amount type, then highest cashback first
    Cashback,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Alphabetical => "alphabetical",
            SortOrder::Popularity => "popularity",
            SortOrder::Cashback => "cashback",
        }
    }
}

/// Everything the user chose in the filter bar
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSelection {
    pub name_filter: NameFilter,
    pub cashback_only: bool,
    pub promoted_only: bool,
    pub sharable_only: bool,
    pub status: StoreStatus,
    pub sort_by: SortOrder,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Type into the search box; clears any letter anchor
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.name_filter = if text.is_empty() {
            NameFilter::None
        } else {
            NameFilter::Substring(text)
        };
        self
    }

    /// Click a letter index label; clears any typed search
    ///
    /// `"All"` or an unknown label resets the name filter.
    pub fn with_letter(mut self, label: &str) -> Self {
        self.name_filter = match IndexLetter::from_label(label) {
            Some(letter) => NameFilter::Anchor(letter),
            None => NameFilter::None,
        };
        self
    }

    pub fn with_cashback_only(mut self, on: bool) -> Self {
        self.cashback_only = on;
        self
    }

    pub fn with_promoted_only(mut self, on: bool) -> Self {
        self.promoted_only = on;
        self
    }

    pub fn with_sharable_only(mut self, on: bool) -> Self {
        self.sharable_only = on;
        self
    }

    pub fn with_status(mut self, status: StoreStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_sort(mut self, sort_by: SortOrder) -> Self {
        self.sort_by = sort_by;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_then_search_clears_letter() {
        let sel = FilterSelection::new().with_letter("C").with_search("amaz");
        assert_eq!(sel.name_filter, NameFilter::Substring("amaz".to_string()));
        assert_eq!(sel.name_filter.selected_label(), "");
        assert_eq!(sel.name_filter.search_text(), "amaz");
    }

    #[test]
    fn test_search_then_letter_clears_search() {
        let sel = FilterSelection::new().with_search("amaz").with_letter("0-9");
        assert_eq!(sel.name_filter, NameFilter::Anchor(IndexLetter::Digit));
        assert_eq!(sel.name_filter.search_text(), "");
    }

    #[test]
    fn test_alternating_selections_keep_one_view() {
        let mut sel = FilterSelection::new();
        for i in 0..20 {
            sel = if i % 2 == 0 {
                sel.with_letter(INDEX_LABELS[2 + i % 10])
            } else {
                sel.with_search(format!("term{}", i))
            };
            let anchor = matches!(sel.name_filter, NameFilter::Anchor(_));
            let text = !sel.name_filter.search_text().is_empty();
            assert!(anchor ^ text, "exactly one view must be active at step {}", i);
        }
    }

    #[test]
    fn test_all_label_clears_name_filter() {
        let sel = FilterSelection::new().with_letter("B").with_letter("All");
        assert_eq!(sel.name_filter, NameFilter::None);
        assert_eq!(sel.name_filter.selected_label(), "All");
    }

    #[test]
    fn test_pattern_roundtrip() {
        for label in INDEX_LABELS.iter().skip(1) {
            let letter = IndexLetter::from_label(label).unwrap();
            assert_eq!(IndexLetter::from_pattern(&letter.pattern()), Some(letter));
        }
        assert_eq!(NameFilter::from_pattern("^[0-9]"), NameFilter::Anchor(IndexLetter::Digit));
        assert_eq!(
            NameFilter::from_pattern("shoe"),
            NameFilter::Substring("shoe".to_string())
        );
        assert_eq!(NameFilter::from_pattern(""), NameFilter::None);
    }

    #[test]
    fn test_lowercase_label_is_uppercased() {
        assert_eq!(IndexLetter::from_label("k"), Some(IndexLetter::Letter('K')));
        assert_eq!(IndexLetter::from_label("KK"), None);
    }

    #[test]
    fn test_empty_search_means_no_filter() {
        let sel = FilterSelection::new().with_letter("A").with_search("");
        assert_eq!(sel.name_filter, NameFilter::None);
        assert_eq!(sel.name_filter.pattern(), None);
    }
}
