//! In-memory implementation of StoreSource for testing and development
//!
//! Evaluates the same query parameters the REST collection understands:
//! `name_like`, flag filters, `_gte`/`_lte` date bounds, `cats`, compound
//! `_sort`/`_order` and `_page`/`_limit`. Failures and latency can be
//! injected to exercise error and race handling.

use crate::core::error::FetchError;
use crate::core::query::{
    CanonicalQuery, PARAM_CASHBACK, PARAM_CATEGORY, PARAM_LIMIT, PARAM_NAME_LIKE, PARAM_ORDER,
    PARAM_PAGE, PARAM_PROMOTED, PARAM_PUBLISHED_GTE, PARAM_PUBLISHED_LTE, PARAM_SHARABLE,
    PARAM_SORT, PARAM_UPDATED_GTE, PARAM_UPDATED_LTE,
};
use crate::core::service::StoreSource;
use crate::core::store::Store;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::RegexBuilder;
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

#[derive(Default)]
struct Behaviour {
    failures: VecDeque<FetchError>,
    page_latency: HashMap<usize, Duration>,
    latency: Duration,
}

/// In-memory store collection
///
/// Uses RwLock for thread-safe access; clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryStoreSource {
    stores: Arc<RwLock<Vec<Store>>>,
    behaviour: Arc<RwLock<Behaviour>>,
    requests: Arc<RwLock<Vec<CanonicalQuery>>>,
}

impl InMemoryStoreSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stores(stores: Vec<Store>) -> Self {
        let source = Self::new();
        if let Ok(mut guard) = source.stores.write() {
            *guard = stores;
        }
        source
    }

    pub fn insert(&self, store: Store) {
        if let Ok(mut stores) = self.stores.write() {
            stores.push(store);
        }
    }

    /// Fail the next request with `error`; queued failures are used in order
    pub fn fail_next(&self, error: FetchError) {
        if let Ok(mut behaviour) = self.behaviour.write() {
            behaviour.failures.push_back(error);
        }
    }

    /// Delay every request
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut behaviour) = self.behaviour.write() {
            behaviour.latency = latency;
        }
    }

    /// Delay requests for one page number, overriding the global latency
    pub fn set_page_latency(&self, page: usize, latency: Duration) {
        if let Ok(mut behaviour) = self.behaviour.write() {
            behaviour.page_latency.insert(page, latency);
        }
    }

    /// Every query received so far, in arrival order
    pub fn requests(&self) -> Vec<CanonicalQuery> {
        self.requests.read().map(|r| r.clone()).unwrap_or_default()
    }

    /// Evaluate `query` against the stored collection
    pub fn evaluate(&self, query: &CanonicalQuery) -> Result<Vec<Store>, FetchError> {
        let stores = self
            .stores
            .read()
            .map_err(|e| FetchError::network(format!("Failed to acquire read lock: {}", e)))?;

        let name_matcher = query.get(PARAM_NAME_LIKE).map(NameMatcher::new);
        let published_lte = bound(query, PARAM_PUBLISHED_LTE)?;
        let published_gte = bound(query, PARAM_PUBLISHED_GTE)?;
        let updated_lte = bound(query, PARAM_UPDATED_LTE)?;
        let updated_gte = bound(query, PARAM_UPDATED_GTE)?;
        let flag = |key: &str| query.get(key) == Some("1");

        let mut matched: Vec<Store> = stores
            .iter()
            .filter(|s| name_matcher.as_ref().is_none_or(|m| m.matches(&s.name)))
            .filter(|s| !flag(PARAM_CASHBACK) || s.cashback_enabled)
            .filter(|s| !flag(PARAM_PROMOTED) || s.is_promoted)
            .filter(|s| !flag(PARAM_SHARABLE) || s.is_sharable)
            .filter(|s| within(s.published_at, published_gte, published_lte))
            .filter(|s| within(s.updated_at, updated_gte, updated_lte))
            .filter(|s| {
                query
                    .get(PARAM_CATEGORY)
                    .is_none_or(|cat| s.cats.iter().any(|c| c == cat))
            })
            .cloned()
            .collect();

        if let Some(sort) = query.get(PARAM_SORT) {
            let keys = sort_keys(sort, query.get(PARAM_ORDER).unwrap_or(""));
            matched.sort_by(|a, b| {
                keys.iter()
                    .map(|(field, desc)| {
                        let ord = compare_field(a, b, field);
                        if *desc { ord.reverse() } else { ord }
                    })
                    .find(|ord| ord.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        let Some(limit) = query.get(PARAM_LIMIT).and_then(|l| l.parse::<usize>().ok()) else {
            return Ok(matched);
        };
        let page = query
            .get(PARAM_PAGE)
            .and_then(|p| p.parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);

        Ok(matched
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect())
    }
}

#[async_trait]
impl StoreSource for InMemoryStoreSource {
    async fn fetch(&self, query: &CanonicalQuery) -> Result<Vec<Store>, FetchError> {
        if let Ok(mut requests) = self.requests.write() {
            requests.push(query.clone());
        }

        let page = query
            .get(PARAM_PAGE)
            .and_then(|p| p.parse::<usize>().ok())
            .unwrap_or(1);
        let (failure, latency) = {
            let mut behaviour = self
                .behaviour
                .write()
                .map_err(|e| FetchError::network(format!("Failed to acquire write lock: {}", e)))?;
            let latency = behaviour
                .page_latency
                .get(&page)
                .copied()
                .unwrap_or(behaviour.latency);
            (behaviour.failures.pop_front(), latency)
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match failure {
            Some(err) => Err(err),
            None => self.evaluate(query),
        }
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// `name_like` is a case-insensitive regex; invalid patterns fall back to a
/// plain substring match
enum NameMatcher {
    Regex(regex::Regex),
    Substring(String),
}

impl NameMatcher {
    fn new(pattern: &str) -> Self {
        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => NameMatcher::Regex(re),
            Err(_) => NameMatcher::Substring(pattern.to_lowercase()),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            NameMatcher::Regex(re) => re.is_match(name),
            NameMatcher::Substring(needle) => name.to_lowercase().contains(needle),
        }
    }
}

fn bound(query: &CanonicalQuery, key: &str) -> Result<Option<DateTime<Utc>>, FetchError> {
    query
        .get(key)
        .map(|v| {
            v.parse::<DateTime<Utc>>()
                .map_err(|e| FetchError::status(400, format!("invalid {} '{}': {}", key, v, e)))
        })
        .transpose()
}

fn within(value: Option<DateTime<Utc>>, gte: Option<DateTime<Utc>>, lte: Option<DateTime<Utc>>) -> bool {
    if gte.is_none() && lte.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    gte.is_none_or(|g| value >= g) && lte.is_none_or(|l| value <= l)
}

fn sort_keys(sort: &str, order: &str) -> Vec<(String, bool)> {
    let orders: Vec<&str> = order.split(',').map(str::trim).collect();
    sort.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .enumerate()
        .map(|(i, field)| {
            let desc = orders.get(i).is_some_and(|o| o.eq_ignore_ascii_case("desc"));
            (field.to_string(), desc)
        })
        .collect()
}

fn compare_field(a: &Store, b: &Store, field: &str) -> Ordering {
    match field {
        "name" => a.name.cmp(&b.name),
        "id" => a.id.cmp(&b.id),
        "clicks" => a.clicks.cmp(&b.clicks),
        "cashback_amount" => a.cashback_amount.total_cmp(&b.cashback_amount),
        "amount_type" => a.amount_type.as_str().cmp(b.amount_type.as_str()),
        "published_at" => a.published_at.cmp(&b.published_at),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => Ordering::Equal,
    }
}
