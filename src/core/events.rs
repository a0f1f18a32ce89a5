//! Listing event bus
//!
//! The session publishes an event for every transition it performs. Renderers,
//! analytics or tests subscribe without touching the controller.
//!
//! ```text
//! session loop ──▶ EventBus::publish() ──▶ broadcast channel ──▶ renderer
//!                                                           ──▶ test subscriber
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Something that happened to the listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ListingEvent {
    /// The list was cleared and page 1 requested
    Reset {
        generation: u64,
        query: String,
    },
    /// Next page requested after a scroll advance
    PageRequested {
        generation: u64,
        page: usize,
    },
    /// A page was merged into the list
    PageLoaded {
        generation: u64,
        page: usize,
        total: usize,
        has_more: bool,
    },
    /// A page request failed
    PageFailed {
        generation: u64,
        page: usize,
        message: String,
    },
    /// A result arrived for a superseded query and was dropped
    StaleDiscarded {
        generation: u64,
        page: usize,
    },
    /// The location was rewritten with `replace`
    LocationReplaced {
        search: String,
    },
    /// The session stopped
    Closed,
}

impl ListingEvent {
    pub fn action(&self) -> &str {
        match self {
            ListingEvent::Reset { .. } => "reset",
            ListingEvent::PageRequested { .. } => "page_requested",
            ListingEvent::PageLoaded { .. } => "page_loaded",
            ListingEvent::PageFailed { .. } => "page_failed",
            ListingEvent::StaleDiscarded { .. } => "stale_discarded",
            ListingEvent::LocationReplaced { .. } => "location_replaced",
            ListingEvent::Closed => "closed",
        }
    }
}

/// Event with the time it was published
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: ListingEvent,
}

impl EventEnvelope {
    pub fn new(event: ListingEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// Cheap to clone. Slow receivers get `Lagged` instead of blocking the
/// session.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of receivers that will see it; zero when nobody
    /// listens.
    pub fn publish(&self, event: ListingEvent) -> usize {
        self.sender.send(EventEnvelope::new(event)).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
