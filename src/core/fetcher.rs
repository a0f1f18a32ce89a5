//! Page fetching on top of a [`StoreSource`]

use crate::core::error::FetchError;
use crate::core::query::CanonicalQuery;
use crate::core::service::StoreSource;
use crate::core::store::Store;
use std::sync::Arc;
use std::time::Duration;

/// One fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub page: usize,
    pub stores: Vec<Store>,
    /// Whether another page may follow
    ///
    /// True iff the page came back full. A short page, empty included, ends
    /// the listing; there is no total-count header.
    pub has_more: bool,
}

/// Issues one request per (query, page) pair
#[derive(Clone)]
pub struct PageFetcher {
    source: Arc<dyn StoreSource>,
    page_size: usize,
    loading_delay: Duration,
}

impl PageFetcher {
    pub fn new(source: Arc<dyn StoreSource>, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            loading_delay: Duration::ZERO,
        }
    }

    /// Minimum wait before every request
    ///
    /// Keeps fast scrolling from hammering the collection.
    pub fn with_loading_delay(mut self, delay: Duration) -> Self {
        self.loading_delay = delay;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn loading_delay(&self) -> Duration {
        self.loading_delay
    }

    /// Fetch `page` (1-based) of `query`
    pub async fn fetch(&self, query: &CanonicalQuery, page: usize) -> Result<FetchedPage, FetchError> {
        let paged = query.with_page(page, self.page_size);

        if !self.loading_delay.is_zero() {
            tokio::time::sleep(self.loading_delay).await;
        }

        tracing::debug!(
            source = self.source.name(),
            page = page,
            query = %paged,
            "Fetching store page"
        );

        let stores = self.source.fetch(&paged).await.inspect_err(|e| {
            tracing::warn!(
                source = self.source.name(),
                page = page,
                code = e.error_code(),
                error = %e,
                "Store page fetch failed"
            );
        })?;

        let has_more = stores.len() == self.page_size;
        tracing::debug!(page = page, count = stores.len(), has_more, "Store page received");

        Ok(FetchedPage {
            page,
            stores,
            has_more,
        })
    }
}
