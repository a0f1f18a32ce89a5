//! Pagination state machine
//!
//! [`ListController`] owns the listing state and decides, for every input,
//! whether to reset to page 1, advance to the next page, or do nothing. It
//! performs no I/O: each transition that needs data returns a
//! [`FetchTicket`], and the caller reports the outcome through
//! [`ListController::complete`].
//!
//! Tickets carry the generation and query they were issued for. Any result
//! whose ticket is no longer current is discarded on arrival, so a slow
//! response for a superseded query can never reach the list.
//!
//! ```text
//!            apply_filters / navigate / select_category / retry
//!   ┌──────────────────────────────────────────────────────────────┐
//!   ▼                                                              │
//! Loading(1) ──ok──▶ Loaded ──advance──▶ Loading(N+1) ──ok──▶ Loaded
//!   │                                         │
//!   └──err──▶ Error ◀─────────────err─────────┘
//! ```

use crate::core::error::FetchError;
use crate::core::fetcher::FetchedPage;
use crate::core::query::{CanonicalQuery, PARAM_CATEGORY};
use crate::core::scroll::LoadGate;
use crate::core::store::{Store, StoreId};
use std::collections::HashSet;

/// Identifies one issued fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    /// Effective query (filters and category) the fetch was issued for
    pub query: CanonicalQuery,
    pub page: usize,
}

/// What happened to a reported fetch result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The ticket was stale or the controller was torn down
    Discarded,
}

/// Read-only view of the listing state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageSnapshot {
    pub items: Vec<Store>,
    pub page_number: usize,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
    /// Effective query string, without page parameters
    pub query: String,
    pub generation: u64,
}

impl PageSnapshot {
    /// Every page was loaded and there is something to show
    pub fn end_of_list(&self) -> bool {
        !self.has_more && !self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Owner of the pagination state
#[derive(Debug)]
pub struct ListController {
    filters: CanonicalQuery,
    category: Option<String>,
    items: Vec<Store>,
    seen: HashSet<StoreId>,
    page_number: usize,
    has_more: bool,
    in_flight: Option<FetchTicket>,
    error: Option<FetchError>,
    generation: u64,
    torn_down: bool,
}

impl ListController {
    /// Create a controller for an initial filter portion and category
    ///
    /// Nothing is fetched until [`ListController::mount`] is called.
    pub fn new(filters: CanonicalQuery, category: Option<String>) -> Self {
        Self {
            filters: filter_portion(&filters),
            category: category.filter(|c| !c.is_empty()),
            items: Vec::new(),
            seen: HashSet::new(),
            page_number: 1,
            has_more: true,
            in_flight: None,
            error: None,
            generation: 0,
            torn_down: false,
        }
    }

    /// Build a controller from a location string
    ///
    /// A `cats` parameter becomes the category; the rest is the filter
    /// portion.
    pub fn from_location(location: &CanonicalQuery) -> Self {
        let (filters, category) = split_category(&location.without_page());
        Self::new(filters, category)
    }

    /// Initial load
    pub fn mount(&mut self) -> Option<FetchTicket> {
        self.reset("mount")
    }

    /// User changed a filter
    ///
    /// Always restarts from page 1, even when the resulting query is equal
    /// to the current one.
    pub fn apply_filters(&mut self, filters: CanonicalQuery) -> Option<FetchTicket> {
        self.filters = filter_portion(&filters);
        self.reset("filters")
    }

    /// The location changed outside the filter bar (back/forward, deep link)
    ///
    /// Restarts from page 1 only when the filter portion or the category
    /// differs from the current ones. The position of `cats` in the location
    /// does not matter.
    pub fn navigate(&mut self, location: &CanonicalQuery) -> Option<FetchTicket> {
        let (filters, category) = split_category(&location.without_page());
        if filters == self.filters && category == self.category {
            tracing::trace!(query = %location, "Location unchanged, keeping listing");
            return None;
        }
        self.filters = filters;
        self.category = category;
        self.reset("navigation")
    }

    /// The category selector changed
    ///
    /// Re-selecting the current category keeps the listing.
    pub fn select_category(&mut self, category: Option<String>) -> Option<FetchTicket> {
        let category = category.filter(|c| !c.is_empty());
        if category == self.category {
            tracing::trace!(category = ?category, "Category unchanged, keeping listing");
            return None;
        }
        self.category = category;
        self.reset("category")
    }

    /// Explicit retry after an error; restarts from page 1
    pub fn retry(&mut self) -> Option<FetchTicket> {
        self.reset("retry")
    }

    /// Scroll reached the end of the list
    ///
    /// Issues the next page only when more pages exist, nothing is in
    /// flight and the last attempt did not fail.
    pub fn advance(&mut self) -> Option<FetchTicket> {
        if self.torn_down || !self.has_more || self.in_flight.is_some() || self.error.is_some() {
            tracing::trace!(
                has_more = self.has_more,
                loading = self.in_flight.is_some(),
                "Advance ignored"
            );
            return None;
        }
        let ticket = FetchTicket {
            generation: self.generation,
            query: self.effective_query(),
            page: self.page_number + 1,
        };
        tracing::debug!(generation = ticket.generation, page = ticket.page, "Advancing listing");
        self.in_flight = Some(ticket.clone());
        Some(ticket)
    }

    /// Report the outcome of a fetch issued for `ticket`
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<FetchedPage, FetchError>,
    ) -> Completion {
        if self.torn_down || self.in_flight.as_ref() != Some(ticket) {
            tracing::debug!(
                generation = ticket.generation,
                current_generation = self.generation,
                page = ticket.page,
                "Discarding stale fetch result"
            );
            return Completion::Discarded;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                if ticket.page == 1 {
                    self.items.clear();
                    self.seen.clear();
                }
                let before = self.items.len();
                for store in page.stores {
                    if self.seen.insert(store.id.clone()) {
                        self.items.push(store);
                    }
                }
                self.has_more = page.has_more;
                self.page_number = ticket.page;
                tracing::debug!(
                    generation = ticket.generation,
                    page = ticket.page,
                    added = self.items.len() - before,
                    total = self.items.len(),
                    has_more = self.has_more,
                    "Page applied"
                );
            }
            Err(err) => {
                // Items and has_more stay as they were.
                tracing::warn!(
                    generation = ticket.generation,
                    page = ticket.page,
                    error = %err,
                    "Page failed"
                );
                self.error = Some(err);
            }
        }
        Completion::Applied
    }

    /// Stop accepting results; everything in flight becomes stale
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.in_flight = None;
    }

    /// Filter portion followed by the category, if any
    pub fn effective_query(&self) -> CanonicalQuery {
        let mut query = self.filters.clone();
        query.remove(PARAM_CATEGORY);
        if let Some(category) = &self.category {
            query.set(PARAM_CATEGORY, category.clone());
        }
        query
    }

    pub fn filters(&self) -> &CanonicalQuery {
        &self.filters
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn items(&self) -> &[Store] {
        &self.items
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn gate(&self) -> LoadGate {
        LoadGate {
            loading: self.is_loading(),
            has_more: self.has_more && self.error.is_none() && !self.torn_down,
        }
    }

    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            items: self.items.clone(),
            page_number: self.page_number,
            has_more: self.has_more,
            loading: self.is_loading(),
            error: self.error.as_ref().map(FetchError::message),
            query: self.effective_query().to_query_string(),
            generation: self.generation,
        }
    }

    fn reset(&mut self, reason: &'static str) -> Option<FetchTicket> {
        if self.torn_down {
            return None;
        }
        self.generation += 1;
        self.items.clear();
        self.seen.clear();
        self.page_number = 1;
        self.has_more = true;
        self.error = None;

        let ticket = FetchTicket {
            generation: self.generation,
            query: self.effective_query(),
            page: 1,
        };
        tracing::debug!(
            reason,
            generation = ticket.generation,
            query = %ticket.query,
            "Listing reset"
        );
        self.in_flight = Some(ticket.clone());
        Some(ticket)
    }
}

fn filter_portion(query: &CanonicalQuery) -> CanonicalQuery {
    let mut filters = query.without_page();
    filters.remove(PARAM_CATEGORY);
    filters
}

fn split_category(location: &CanonicalQuery) -> (CanonicalQuery, Option<String>) {
    let mut filters = location.clone();
    let category = filters.remove(PARAM_CATEGORY).filter(|c| !c.is_empty());
    (filters, category)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_SIZE: usize = 20;

    fn stores(range: std::ops::Range<u64>) -> Vec<Store> {
        range.map(|i| Store::new(i, format!("Store {}", i))).collect()
    }

    fn page(number: usize, stores: Vec<Store>) -> Result<FetchedPage, FetchError> {
        let has_more = stores.len() == PAGE_SIZE;
        Ok(FetchedPage {
            page: number,
            stores,
            has_more,
        })
    }

    fn query(s: &str) -> CanonicalQuery {
        CanonicalQuery::parse(s)
    }

    #[test]
    fn test_mount_issues_first_page() {
        let mut ctl = ListController::new(query("_sort=name"), None);
        let ticket = ctl.mount().unwrap();
        assert_eq!(ticket.page, 1);
        assert_eq!(ticket.query, query("_sort=name"));
        assert!(ctl.is_loading());
        assert!(!ctl.gate().is_open());
    }

    #[test]
    fn test_full_page_then_short_page_ends_listing() {
        let mut ctl = ListController::new(query("_sort=name"), None);
        let t1 = ctl.mount().unwrap();
        assert_eq!(ctl.complete(&t1, page(1, stores(0..20))), Completion::Applied);
        assert!(ctl.has_more());
        assert_eq!(ctl.page_number(), 1);

        let t2 = ctl.advance().unwrap();
        assert_eq!(t2.page, 2);
        // Only one fetch at a time.
        assert!(ctl.advance().is_none());

        ctl.complete(&t2, page(2, stores(20..25)));
        assert_eq!(ctl.items().len(), 25);
        assert!(!ctl.has_more());
        assert_eq!(ctl.page_number(), 2);
        assert!(ctl.snapshot().end_of_list());
        assert!(ctl.advance().is_none());
    }

    #[test]
    fn test_append_dedups_preserving_first_seen_order() {
        let mut ctl = ListController::new(CanonicalQuery::new(), None);
        let t1 = ctl.mount().unwrap();
        ctl.complete(&t1, page(1, stores(0..20)));

        let t2 = ctl.advance().unwrap();
        // Overlapping page: 15..35
        ctl.complete(&t2, page(2, stores(15..35)));

        let ids: Vec<StoreId> = ctl.items().iter().map(|s| s.id.clone()).collect();
        let expected: Vec<StoreId> = (0..35).map(StoreId::Number).collect();
        assert_eq!(ids, expected);
        // has_more follows the fetched page length, not the number added.
        assert!(ctl.has_more());
    }

    #[test]
    fn test_filter_change_during_page_two_discards_it() {
        let mut ctl = ListController::new(query("_sort=name"), None);
        let t1 = ctl.mount().unwrap();
        ctl.complete(&t1, page(1, stores(0..20)));
        let t2 = ctl.advance().unwrap();

        let t3 = ctl.apply_filters(query("_sort=clicks&_order=desc")).unwrap();
        assert!(ctl.items().is_empty());

        assert_eq!(ctl.complete(&t2, page(2, stores(20..25))), Completion::Discarded);
        assert!(ctl.is_loading(), "the new first page is still outstanding");

        ctl.complete(&t3, page(1, stores(100..110)));
        let ids: Vec<StoreId> = ctl.items().iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, (100..110).map(StoreId::Number).collect::<Vec<_>>());
    }

    #[test]
    fn test_stale_first_page_never_clobbers_newer_query() {
        let mut ctl = ListController::new(query("name_like=a"), None);
        let old = ctl.mount().unwrap();
        let new = ctl.apply_filters(query("name_like=b")).unwrap();

        ctl.complete(&new, page(1, stores(50..52)));
        assert_eq!(ctl.complete(&old, page(1, stores(0..20))), Completion::Discarded);
        assert_eq!(ctl.items().len(), 2);
        assert_eq!(ctl.items()[0].id, StoreId::Number(50));
    }

    #[test]
    fn test_later_page_failure_keeps_items() {
        let mut ctl = ListController::new(CanonicalQuery::new(), None);
        let t1 = ctl.mount().unwrap();
        ctl.complete(&t1, page(1, stores(0..20)));
        let t2 = ctl.advance().unwrap();

        ctl.complete(&t2, Err(FetchError::status(500, "boom")));
        assert_eq!(ctl.items().len(), 20);
        assert!(ctl.has_more(), "has_more is left unchanged");
        assert!(!ctl.is_loading());
        assert!(!ctl.snapshot().error.unwrap().is_empty());
        // No automatic retry through scrolling.
        assert!(ctl.advance().is_none());

        let t3 = ctl.apply_filters(query("_sort=name")).unwrap();
        assert!(ctl.error().is_none());
        ctl.complete(&t3, page(1, stores(0..3)));
        assert!(ctl.error().is_none());
        assert_eq!(ctl.items().len(), 3);
    }

    #[test]
    fn test_first_page_failure_leaves_empty_list() {
        let mut ctl = ListController::new(CanonicalQuery::new(), None);
        let t1 = ctl.mount().unwrap();
        ctl.complete(&t1, Err(FetchError::network("offline")));
        assert!(ctl.items().is_empty());
        assert!(ctl.error().is_some());

        let t2 = ctl.retry().unwrap();
        assert_eq!(t2.page, 1);
        assert!(ctl.error().is_none());
    }

    #[test]
    fn test_navigate_same_location_is_noop() {
        let mut ctl = ListController::new(query("_sort=name"), Some("7".to_string()));
        let t1 = ctl.mount().unwrap();
        ctl.complete(&t1, page(1, stores(0..20)));

        assert!(ctl.navigate(&query("_sort=name&cats=7")).is_none());
        assert_eq!(ctl.items().len(), 20);

        let t2 = ctl.navigate(&query("_sort=clicks&cats=7")).unwrap();
        assert_eq!(t2.query, query("_sort=clicks&cats=7"));
        assert_eq!(ctl.category(), Some("7"));
    }

    #[test]
    fn test_navigate_ignores_category_position() {
        let mut ctl = ListController::from_location(&query("cats=3&_sort=name"));
        let t1 = ctl.mount().unwrap();
        ctl.complete(&t1, page(1, stores(0..20)));

        assert!(ctl.navigate(&query("cats=3&_sort=name")).is_none());
        assert!(ctl.navigate(&query("?_sort=name&_page=2&cats=3")).is_none());
        assert_eq!(ctl.generation(), 1);
        assert_eq!(ctl.items().len(), 20);

        // Filter order still matters.
        let ticket = ctl.navigate(&query("cats=4&_sort=name")).unwrap();
        assert_eq!(ticket.query.to_query_string(), "_sort=name&cats=4");
    }

    #[test]
    fn test_reselecting_category_keeps_listing() {
        let mut ctl = ListController::new(query("_sort=name"), Some("7".to_string()));
        let t1 = ctl.mount().unwrap();
        ctl.complete(&t1, page(1, stores(0..20)));

        assert!(ctl.select_category(Some("7".to_string())).is_none());
        assert!(ctl.select_category(Some("8".to_string())).is_some());
        assert!(ctl.select_category(Some("8".to_string())).is_none());
        assert!(ctl.select_category(Some(String::new())).is_some());
        assert!(ctl.select_category(None).is_none());
        assert_eq!(ctl.generation(), 3);
    }

    #[test]
    fn test_category_param_in_filters_is_dropped() {
        let mut ctl = ListController::new(query("cats=1&_sort=name"), None);
        assert_eq!(ctl.effective_query(), query("_sort=name"));
        ctl.apply_filters(query("_sort=clicks&cats=2"));
        assert_eq!(ctl.filters(), &query("_sort=clicks"));
    }

    #[test]
    fn test_category_is_independent_of_filters() {
        let mut ctl = ListController::new(query("name_like=%5EA&_sort=name"), None);
        ctl.mount();
        let ticket = ctl.select_category(Some("12".to_string())).unwrap();
        assert_eq!(ticket.query.to_query_string(), "name_like=%5EA&_sort=name&cats=12");

        let ticket = ctl.apply_filters(query("_sort=clicks")).unwrap();
        assert_eq!(ticket.query.to_query_string(), "_sort=clicks&cats=12");

        let ticket = ctl.select_category(None).unwrap();
        assert_eq!(ticket.query.to_query_string(), "_sort=clicks");
    }

    #[test]
    fn test_teardown_discards_in_flight() {
        let mut ctl = ListController::new(CanonicalQuery::new(), None);
        let t1 = ctl.mount().unwrap();
        ctl.teardown();
        assert!(!ctl.gate().is_open());
        assert_eq!(ctl.complete(&t1, page(1, stores(0..5))), Completion::Discarded);
        assert!(ctl.items().is_empty());
        assert!(ctl.apply_filters(CanonicalQuery::new()).is_none());
        assert!(ctl.advance().is_none());
    }

    #[test]
    fn test_from_location_splits_category() {
        let ctl = ListController::from_location(&query("cats=3&_sort=name&_page=4"));
        assert_eq!(ctl.category(), Some("3"));
        assert_eq!(ctl.filters(), &query("_sort=name"));
    }

    #[test]
    fn test_pages_applied_through_arbitrary_sequence_never_duplicate() {
        let mut ctl = ListController::new(CanonicalQuery::new(), None);
        let t = ctl.mount().unwrap();
        ctl.complete(&t, page(1, stores(0..20)));

        let ranges = [10..30, 25..45, 0..20, 40..60];
        for range in ranges {
            let t = ctl.advance().unwrap();
            ctl.complete(&t, page(t.page, stores(range)));
        }

        let mut ids = HashSet::new();
        for store in ctl.items() {
            assert!(ids.insert(store.id.clone()), "duplicate id {}", store.id);
        }
        assert_eq!(ctl.items().len(), 60);
        assert_eq!(ctl.page_number(), 5);
    }
}
