//! # store-feed
//!
//! Incremental-fetch controller for a filterable, infinitely scrolling store
//! listing.
//!
//! ## Features
//!
//! - **Canonical Queries**: Filter bar state maps to one ordered query string
//! - **Paged Fetching**: Fixed-size pages with end-of-list detection
//! - **Stale-Result Safety**: Responses for superseded queries never reach the list
//! - **Scroll Trigger**: Sentinel visibility coalesced into single advances
//! - **Shareable Locations**: The effective query is reflected with `replace`
//! - **Pluggable Sources**: REST collection over `reqwest` or in-memory
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use store_feed::prelude::*;
//!
//! let session = SessionBuilder::new()
//!     .with_config(ListingConfig::from_yaml_file("listing.yaml")?)
//!     .start()?;
//!
//! session.apply_filters(
//!     FilterSelection::new()
//!         .with_letter("B")
//!         .with_cashback_only(true)
//!         .with_sort(SortOrder::Popularity),
//! )?;
//!
//! let page = session.wait_for(|s| !s.loading && s.generation >= 2).await?;
//! for store in &page.items {
//!     println!("{} {}", store.name, store.cashback_label());
//! }
//! ```

pub mod config;
pub mod core;
pub mod session;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Listing Model ===
    pub use crate::core::{
        filter::{FilterSelection, INDEX_LABELS, IndexLetter, NameFilter, SortOrder, StoreStatus},
        query::{CanonicalQuery, QueryBuilder},
        store::{AmountType, RateType, Store, StoreId},
    };

    // === Pagination ===
    pub use crate::core::{
        controller::{Completion, FetchTicket, ListController, PageSnapshot},
        fetcher::{FetchedPage, PageFetcher},
        scroll::{Advance, Bounds, LoadGate, ObserverOptions, ScrollTrigger, VisibilityEntry},
        service::StoreSource,
    };

    // === Events ===
    pub use crate::core::events::{EventBus, EventEnvelope, ListingEvent};

    // === Errors ===
    pub use crate::core::error::{ConfigError, FetchError, ListingError};

    // === Configuration ===
    pub use crate::config::ListingConfig;

    // === Session ===
    pub use crate::session::{InMemoryHistory, ListingSession, LocationSink, SessionBuilder};

    // === Sources ===
    pub use crate::storage::{BOOKMARKS_KEY, BookmarkSet, HttpStoreSource, InMemoryStoreSource};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
