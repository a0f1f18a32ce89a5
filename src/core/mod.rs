//! Core module containing the listing model, query mapping and pagination logic

pub mod controller;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod filter;
pub mod query;
pub mod scroll;
pub mod service;
pub mod store;

pub use controller::{Completion, FetchTicket, ListController, PageSnapshot};
pub use error::{ConfigError, FetchError, ListingError};
pub use events::{EventBus, EventEnvelope, ListingEvent};
pub use fetcher::{FetchedPage, PageFetcher};
pub use filter::{FilterSelection, INDEX_LABELS, IndexLetter, NameFilter, SortOrder, StoreStatus};
pub use query::{CanonicalQuery, QueryBuilder};
pub use scroll::{Advance, Bounds, LoadGate, ObserverOptions, ScrollTrigger, VisibilityEntry};
pub use service::StoreSource;
pub use store::{AmountType, RateType, Store, StoreId};
