//! SessionBuilder for wiring a listing session

use super::location::{InMemoryHistory, LocationSink};
use super::{ListingSession, SessionLoop};
use crate::config::ListingConfig;
use crate::core::controller::ListController;
use crate::core::error::ListingError;
use crate::core::events::EventBus;
use crate::core::fetcher::PageFetcher;
use crate::core::filter::FilterSelection;
use crate::core::query::CanonicalQuery;
use crate::core::service::StoreSource;
use crate::storage::HttpStoreSource;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Builder for a [`ListingSession`]
///
/// # Example
///
/// ```ignore
/// let session = SessionBuilder::new()
///     .with_config(ListingConfig::from_yaml_file("listing.yaml")?)
///     .with_location(history.clone())
///     .start()?;
/// ```
pub struct SessionBuilder {
    config: ListingConfig,
    source: Option<Arc<dyn StoreSource>>,
    location: Option<Arc<dyn LocationSink>>,
    event_bus: Option<EventBus>,
    category: Option<String>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            config: ListingConfig::default_config(),
            source: None,
            location: None,
            event_bus: None,
            category: None,
        }
    }

    pub fn with_config(mut self, config: ListingConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the store source
    ///
    /// Defaults to an [`HttpStoreSource`] for the configured collection.
    pub fn with_source(mut self, source: impl StoreSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn with_shared_source(mut self, source: Arc<dyn StoreSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set where the effective query is reflected
    ///
    /// The sink's current value seeds the initial filters and category.
    /// Defaults to an empty [`InMemoryHistory`].
    pub fn with_location(mut self, location: impl LocationSink + 'static) -> Self {
        self.location = Some(Arc::new(location));
        self
    }

    /// Share an existing event bus instead of creating one
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Category to start with when the location names none
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Spawn the session loop and issue the initial fetch
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(self) -> Result<ListingSession, ListingError> {
        self.config.validate()?;

        let source: Arc<dyn StoreSource> = match self.source {
            Some(source) => source,
            None => Arc::new(HttpStoreSource::from_config(&self.config)?),
        };
        let location: Arc<dyn LocationSink> = match self.location {
            Some(location) => location,
            None => Arc::new(InMemoryHistory::default()),
        };
        let events = self
            .event_bus
            .unwrap_or_else(|| EventBus::new(self.config.event_capacity));

        let initial = CanonicalQuery::parse(&location.current());
        let initial_selection = FilterSelection::from_query(&initial);
        let mut controller = ListController::from_location(&initial);
        if controller.category().is_none() && self.category.is_some() {
            controller = ListController::new(controller.filters().clone(), self.category);
        }

        let fetcher = PageFetcher::new(source.clone(), self.config.page_size)
            .with_loading_delay(self.config.loading_delay());

        tracing::debug!(
            source = source.name(),
            location = %initial,
            "Starting listing session"
        );

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (advance_tx, advance_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(controller.snapshot());
        let (gate_tx, gate_rx) = watch::channel(controller.gate());

        let session_loop = SessionLoop {
            controller,
            fetcher,
            location,
            events: events.clone(),
            state_tx,
            gate_tx,
            outcome_tx,
        };
        let task = tokio::spawn(session_loop.run(command_rx, advance_rx, outcome_rx));

        Ok(ListingSession {
            commands: command_tx,
            advance_tx,
            state: state_rx,
            gate: gate_rx,
            events,
            observer_options: self.config.observer_options(),
            initial_selection,
            task: Some(task),
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
