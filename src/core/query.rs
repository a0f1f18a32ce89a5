//! Canonical query parameters and the filter-to-query mapping
//!
//! [`QueryBuilder`] turns a [`FilterSelection`] into a [`CanonicalQuery`]:
//! an insertion-ordered parameter set that compares, prints and reflects
//! into the location identically for identical input.
//!
//! # Example
//!
//! ```rust,ignore
//! let selection = FilterSelection::new()
//!     .with_letter("B")
//!     .with_cashback_only(true)
//!     .with_sort(SortOrder::Popularity);
//!
//! let query = QueryBuilder::build(&selection);
//! // name_like=%5EB&cashback_enabled=1&published_at_lte=...&_sort=clicks&_order=desc
//! println!("{}", query);
//! ```

use crate::core::filter::{FilterSelection, NameFilter, SortOrder, StoreStatus};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use indexmap::IndexMap;
use reqwest::Url;
use std::fmt;

pub const PARAM_NAME_LIKE: &str = "name_like";
pub const PARAM_CASHBACK: &str = "cashback_enabled";
pub const PARAM_PROMOTED: &str = "is_promoted";
pub const PARAM_SHARABLE: &str = "is_sharable";
pub const PARAM_PUBLISHED_LTE: &str = "published_at_lte";
pub const PARAM_PUBLISHED_GTE: &str = "published_at_gte";
pub const PARAM_UPDATED_GTE: &str = "updated_at_gte";
pub const PARAM_UPDATED_LTE: &str = "updated_at_lte";
pub const PARAM_STATUS: &str = "status";
pub const PARAM_CATEGORY: &str = "cats";
pub const PARAM_SORT: &str = "_sort";
pub const PARAM_ORDER: &str = "_order";
pub const PARAM_PAGE: &str = "_page";
pub const PARAM_LIMIT: &str = "_limit";

/// Length of the recency window used by [`StoreStatus::Discontinued`]
pub const RECENT_UPDATE_WINDOW_DAYS: i64 = 7;

// Only used to borrow the form encoder of `Url`.
const ENCODING_BASE: &str = "http://query.invalid/";

/// Ordered parameter set
///
/// Two queries are equal only when they hold the same pairs in the same
/// order, which is also what makes their string forms equal.
#[derive(Debug, Clone, Default)]
pub struct CanonicalQuery {
    params: IndexMap<String, String>,
}

impl CanonicalQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter
    ///
    /// A new key is appended; an existing key keeps its position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Remove a parameter, keeping the order of the others
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.params.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of this query with pagination parameters appended
    pub fn with_page(&self, page: usize, limit: usize) -> Self {
        let mut paged = self.clone();
        paged.set(PARAM_PAGE, page.to_string());
        paged.set(PARAM_LIMIT, limit.to_string());
        paged
    }

    /// Copy of this query without pagination parameters
    pub fn without_page(&self) -> Self {
        let mut query = self.clone();
        query.remove(PARAM_PAGE);
        query.remove(PARAM_LIMIT);
        query
    }

    /// Form-encoded string, without a leading `?`
    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }
        let mut url = Self::encoding_base();
        url.query_pairs_mut().extend_pairs(self.iter());
        url.query().unwrap_or_default().to_string()
    }

    /// Parse a form-encoded string; a leading `?` is ignored
    ///
    /// Repeated keys keep their first position and last value.
    pub fn parse(search: &str) -> Self {
        let search = search.strip_prefix('?').unwrap_or(search);
        let mut query = Self::new();
        if search.is_empty() {
            return query;
        }
        let mut url = Self::encoding_base();
        url.set_query(Some(search));
        for (key, value) in url.query_pairs() {
            query.set(key.into_owned(), value.into_owned());
        }
        query
    }

    fn encoding_base() -> Url {
        Url::parse(ENCODING_BASE).expect("static encoding base is a valid url")
    }
}

impl PartialEq for CanonicalQuery {
    fn eq(&self, other: &Self) -> bool {
        self.params.len() == other.params.len() && self.params.iter().eq(other.params.iter())
    }
}

impl Eq for CanonicalQuery {}

impl fmt::Display for CanonicalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CanonicalQuery {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Self::new();
        for (k, v) in iter {
            query.set(k, v);
        }
        query
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Maps filter selections to canonical queries
pub struct QueryBuilder;

impl QueryBuilder {
    /// Build the filter/sort portion of the query relative to the current time
    pub fn build(selection: &FilterSelection) -> CanonicalQuery {
        Self::build_at(selection, Utc::now())
    }

    /// Build the filter/sort portion of the query relative to `now`
    ///
    /// Pure: the same selection and instant always give the same query.
    pub fn build_at(selection: &FilterSelection, now: DateTime<Utc>) -> CanonicalQuery {
        let mut query = CanonicalQuery::new();

        if let Some(pattern) = selection.name_filter.pattern() {
            query.set(PARAM_NAME_LIKE, pattern);
        }

        // Flags are only ever sent when set.
        if selection.cashback_only {
            query.set(PARAM_CASHBACK, "1");
        }
        if selection.promoted_only {
            query.set(PARAM_PROMOTED, "1");
        }
        if selection.sharable_only {
            query.set(PARAM_SHARABLE, "1");
        }

        match selection.status {
            StoreStatus::Active => {
                query.set(PARAM_PUBLISHED_LTE, timestamp(now));
            }
            StoreStatus::ComingSoon => {
                query.set(PARAM_PUBLISHED_GTE, timestamp(now));
            }
            StoreStatus::Discontinued => {
                let since = now - Duration::days(RECENT_UPDATE_WINDOW_DAYS);
                query.set(PARAM_UPDATED_GTE, timestamp(since));
                query.set(PARAM_UPDATED_LTE, timestamp(now));
            }
        }

        match selection.sort_by {
            SortOrder::Alphabetical => {
                query.set(PARAM_SORT, "name");
            }
            SortOrder::Popularity => {
                query.set(PARAM_SORT, "clicks");
                query.set(PARAM_ORDER, "desc");
            }
            SortOrder::Cashback => {
                query.set(PARAM_SORT, "amount_type,cashback_amount");
                query.set(PARAM_ORDER, "asc,desc");
            }
        }

        query
    }
}

impl FilterSelection {
    /// Recover the selection a query was built from
    ///
    /// Used to seed the filter bar from a location string. Unknown
    /// parameters are ignored; missing ones take their defaults.
    pub fn from_query(query: &CanonicalQuery) -> Self {
        let flag = |key: &str| query.get(key) == Some("1");

        let status = query
            .get(PARAM_STATUS)
            .and_then(StoreStatus::parse)
            .unwrap_or_else(|| {
                if query.contains(PARAM_UPDATED_GTE) {
                    StoreStatus::Discontinued
                } else if query.contains(PARAM_PUBLISHED_GTE) {
                    StoreStatus::ComingSoon
                } else {
                    StoreStatus::Active
                }
            });

        let sort_by = match query.get(PARAM_SORT) {
            Some("clicks") => SortOrder::Popularity,
            Some(sort) if sort.contains("cashback") => SortOrder::Cashback,
            _ => SortOrder::Alphabetical,
        };

        Self {
            name_filter: query
                .get(PARAM_NAME_LIKE)
                .map(NameFilter::from_pattern)
                .unwrap_or_default(),
            cashback_only: flag(PARAM_CASHBACK),
            promoted_only: flag(PARAM_PROMOTED),
            sharable_only: flag(PARAM_SHARABLE),
            status,
            sort_by,
        }
    }
}
