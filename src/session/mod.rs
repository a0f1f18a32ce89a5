//! Listing session: the scheduler that drives the controller
//!
//! A session is one spawned task that exclusively owns a [`ListController`].
//! Every input (filter changes, navigations, category changes, scroll
//! advances, fetch completions) arrives as a message and is processed in
//! order, so the controller never needs locking.
//!
//! ```text
//! UI ──apply_filters / navigate / select_category / retry──┐
//! ScrollTrigger ──Advance──────────────────────────────────┤
//! fetch tasks ──(ticket, result)───────────────────────────┤
//!                                                          ▼
//!                                                   session loop
//!                                                    │  │  │
//!                         watch<PageSnapshot> ◀──────┘  │  └──▶ LocationSink::replace
//!                         watch<LoadGate> ◀─────────────┘
//!                                                   EventBus ──▶ subscribers
//! ```

pub mod builder;
pub mod location;

pub use builder::SessionBuilder;
pub use location::{InMemoryHistory, LocationSink};

use crate::core::controller::{Completion, FetchTicket, ListController, PageSnapshot};
use crate::core::error::{FetchError, ListingError};
use crate::core::events::{EventBus, EventEnvelope, ListingEvent};
use crate::core::fetcher::{FetchedPage, PageFetcher};
use crate::core::filter::FilterSelection;
use crate::core::query::{CanonicalQuery, QueryBuilder};
use crate::core::scroll::{Advance, LoadGate, ObserverOptions, ScrollTrigger};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

enum Command {
    ApplyFilters(FilterSelection),
    Navigate(String),
    SelectCategory(Option<String>),
    Retry,
    Advance,
    Shutdown,
}

type FetchOutcome = (FetchTicket, Result<FetchedPage, FetchError>);

/// Handle to a running listing session
///
/// Dropping every handle stops the session; [`ListingSession::shutdown`]
/// does so explicitly and waits for the loop to finish.
pub struct ListingSession {
    commands: mpsc::UnboundedSender<Command>,
    advance_tx: mpsc::UnboundedSender<Advance>,
    state: watch::Receiver<PageSnapshot>,
    gate: watch::Receiver<LoadGate>,
    events: EventBus,
    observer_options: ObserverOptions,
    initial_selection: FilterSelection,
    task: Option<JoinHandle<()>>,
}

impl ListingSession {
    /// User changed the filter bar
    pub fn apply_filters(&self, selection: FilterSelection) -> Result<(), ListingError> {
        self.send(Command::ApplyFilters(selection))
    }

    /// The location changed outside the filter bar (back/forward, deep link)
    pub fn navigate(&self, search: &str) -> Result<(), ListingError> {
        self.send(Command::Navigate(search.to_string()))
    }

    /// The category sidebar changed
    pub fn select_category(&self, category: Option<String>) -> Result<(), ListingError> {
        self.send(Command::SelectCategory(category))
    }

    /// Restart from page 1 after an error
    pub fn retry(&self) -> Result<(), ListingError> {
        self.send(Command::Retry)
    }

    /// Request the next page directly, bypassing the scroll trigger
    pub fn advance(&self) -> Result<(), ListingError> {
        self.send(Command::Advance)
    }

    /// New scroll trigger wired to this session
    pub fn scroll_trigger(&self) -> ScrollTrigger {
        ScrollTrigger::new(
            self.observer_options,
            self.gate.clone(),
            self.advance_tx.clone(),
        )
    }

    /// Filter bar state recovered from the startup location
    pub fn initial_selection(&self) -> &FilterSelection {
        &self.initial_selection
    }

    pub fn snapshot(&self) -> PageSnapshot {
        self.state.borrow().clone()
    }

    pub fn gate(&self) -> LoadGate {
        *self.gate.borrow()
    }

    /// Receiver notified after every state transition
    pub fn subscribe(&self) -> watch::Receiver<PageSnapshot> {
        self.state.clone()
    }

    pub fn events(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<PageSnapshot, ListingError>
    where
        F: FnMut(&PageSnapshot) -> bool,
    {
        let mut rx = self.state.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| ListingError::SessionClosed)?;
        Ok(snapshot.clone())
    }

    /// Stop the session and wait for the loop to exit
    pub async fn shutdown(mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    fn send(&self, command: Command) -> Result<(), ListingError> {
        self.commands
            .send(command)
            .map_err(|_| ListingError::SessionClosed)
    }
}

/// State owned by the session task
struct SessionLoop {
    controller: ListController,
    fetcher: PageFetcher,
    location: Arc<dyn LocationSink>,
    events: EventBus,
    state_tx: watch::Sender<PageSnapshot>,
    gate_tx: watch::Sender<LoadGate>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
}

impl SessionLoop {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut advances: mpsc::UnboundedReceiver<Advance>,
        mut outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
    ) {
        tracing::info!(
            query = %self.controller.effective_query(),
            page_size = self.fetcher.page_size(),
            "Listing session started"
        );

        let ticket = self.controller.mount();
        self.start(ticket);
        self.publish_state();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                Some(advance) = advances.recv() => {
                    tracing::trace!(sentinel = %advance.sentinel, "Scroll advance received");
                    self.handle(Command::Advance);
                }
                Some((ticket, result)) = outcomes.recv() => self.complete(ticket, result),
            }
            self.publish_state();
        }

        self.controller.teardown();
        self.publish_state();
        self.events.publish(ListingEvent::Closed);
        tracing::info!("Listing session stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::ApplyFilters(selection) => {
                let ticket = self.controller.apply_filters(QueryBuilder::build(&selection));
                self.reflect_location();
                self.start(ticket);
            }
            Command::Navigate(search) => {
                let ticket = self.controller.navigate(&CanonicalQuery::parse(&search));
                self.start(ticket);
            }
            Command::SelectCategory(category) => {
                let ticket = self.controller.select_category(category);
                if ticket.is_some() {
                    self.reflect_location();
                }
                self.start(ticket);
            }
            Command::Retry => {
                let ticket = self.controller.retry();
                self.start(ticket);
            }
            Command::Advance => {
                let ticket = self.controller.advance();
                self.start(ticket);
            }
            Command::Shutdown => {}
        }
    }

    fn start(&self, ticket: Option<FetchTicket>) {
        let Some(ticket) = ticket else {
            return;
        };

        if ticket.page == 1 {
            self.events.publish(ListingEvent::Reset {
                generation: ticket.generation,
                query: ticket.query.to_query_string(),
            });
        } else {
            self.events.publish(ListingEvent::PageRequested {
                generation: ticket.generation,
                page: ticket.page,
            });
        }

        let fetcher = self.fetcher.clone();
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch(&ticket.query, ticket.page).await;
            // The session may be gone; the result is stale then anyway.
            let _ = outcome_tx.send((ticket, result));
        });
    }

    fn complete(&mut self, ticket: FetchTicket, result: Result<FetchedPage, FetchError>) {
        let failure = result.as_ref().err().map(FetchError::message);

        let event = match self.controller.complete(&ticket, result) {
            Completion::Discarded => ListingEvent::StaleDiscarded {
                generation: ticket.generation,
                page: ticket.page,
            },
            Completion::Applied => match failure {
                Some(message) => ListingEvent::PageFailed {
                    generation: ticket.generation,
                    page: ticket.page,
                    message,
                },
                None => ListingEvent::PageLoaded {
                    generation: ticket.generation,
                    page: ticket.page,
                    total: self.controller.items().len(),
                    has_more: self.controller.has_more(),
                },
            },
        };
        self.events.publish(event);
    }

    fn reflect_location(&self) {
        let search = self.controller.effective_query().to_query_string();
        self.location.replace(&search);
        self.events.publish(ListingEvent::LocationReplaced { search });
    }

    fn publish_state(&self) {
        self.gate_tx.send_replace(self.controller.gate());
        self.state_tx.send_replace(self.controller.snapshot());
    }
}
