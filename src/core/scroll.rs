//! Scroll-driven page advancement
//!
//! The UI reports visibility changes of the last rendered store (the
//! sentinel). Once the sentinel is sufficiently visible the trigger waits a
//! short settle delay, so scroll jitter collapses into one signal, and then
//! emits a single [`Advance`] token to the session.
//!
//! ```text
//! UI ──attach(last id)──▶ ScrollTrigger ◀──watch── LoadGate (controller)
//! UI ──observe(entry)───▶      │
//!                              └──settle──▶ mpsc Advance ──▶ session loop
//! ```

use crate::core::store::StoreId;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Controller flags the trigger is allowed to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadGate {
    /// A fetch for the current query is outstanding
    pub loading: bool,
    /// The last page came back full
    pub has_more: bool,
}

impl LoadGate {
    pub fn is_open(&self) -> bool {
        self.has_more && !self.loading
    }
}

impl Default for LoadGate {
    fn default() -> Self {
        Self {
            loading: false,
            has_more: true,
        }
    }
}

/// Token asking the session to load the next page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    /// Sentinel that caused the advance
    pub sentinel: StoreId,
}

/// Observer tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    /// Fraction of the sentinel that must be visible
    pub threshold: f64,
    /// Pixels the viewport is grown by at the top and bottom
    pub root_margin_px: f64,
    pub settle_delay: Duration,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            root_margin_px: 100.0,
            settle_delay: Duration::from_millis(100),
        }
    }
}

/// Vertical extent of an element or of the viewport, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// A visibility report from the UI
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityEntry {
    pub target: StoreId,
    pub element: Bounds,
    pub viewport: Bounds,
}

impl VisibilityEntry {
    /// Visible fraction of the element inside the viewport grown by `margin`
    pub fn intersection_ratio(&self, margin: f64) -> f64 {
        if self.element.height <= 0.0 {
            return 0.0;
        }
        let root_top = self.viewport.top - margin;
        let root_bottom = self.viewport.bottom() + margin;
        let overlap = self.element.bottom().min(root_bottom) - self.element.top.max(root_top);
        (overlap.max(0.0) / self.element.height).min(1.0)
    }
}

struct Attachment {
    sentinel: StoreId,
    has_more: bool,
    armed: bool,
}

/// Visibility observer bound to one sentinel at a time
pub struct ScrollTrigger {
    options: ObserverOptions,
    gate: watch::Receiver<LoadGate>,
    advance_tx: mpsc::UnboundedSender<Advance>,
    attached: Option<Attachment>,
    pending: Option<JoinHandle<()>>,
}

impl ScrollTrigger {
    pub fn new(
        options: ObserverOptions,
        gate: watch::Receiver<LoadGate>,
        advance_tx: mpsc::UnboundedSender<Advance>,
    ) -> Self {
        Self {
            options,
            gate,
            advance_tx,
            attached: None,
            pending: None,
        }
    }

    pub fn options(&self) -> &ObserverOptions {
        &self.options
    }

    /// Observe `sentinel`, the last rendered store
    ///
    /// Any previous sentinel is detached first, cancelling its pending
    /// advance.
    pub fn attach(&mut self, sentinel: StoreId, has_more: bool) {
        self.detach();
        tracing::trace!(sentinel = %sentinel, has_more, "Sentinel attached");
        self.attached = Some(Attachment {
            sentinel,
            has_more,
            armed: true,
        });
    }

    /// Stop observing and cancel any pending advance
    pub fn detach(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.attached = None;
    }

    pub fn sentinel(&self) -> Option<&StoreId> {
        self.attached.as_ref().map(|a| &a.sentinel)
    }

    /// Whether an advance is waiting out the settle delay
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Feed a visibility change
    ///
    /// Returns `true` when this entry scheduled an advance.
    pub fn observe(&mut self, entry: &VisibilityEntry) -> bool {
        let Some(attachment) = self.attached.as_mut() else {
            return false;
        };
        if attachment.sentinel != entry.target || !attachment.armed || !attachment.has_more {
            return false;
        }

        let ratio = entry.intersection_ratio(self.options.root_margin_px);
        if ratio <= 0.0 || ratio < self.options.threshold {
            return false;
        }

        if !self.gate.borrow().is_open() {
            return false;
        }

        if self.pending.as_ref().is_some_and(|h| !h.is_finished()) {
            return false;
        }

        attachment.armed = false;
        let token = Advance {
            sentinel: attachment.sentinel.clone(),
        };
        let gate = self.gate.clone();
        let tx = self.advance_tx.clone();
        let settle = self.options.settle_delay;

        self.pending = Some(tokio::spawn(async move {
            if !settle.is_zero() {
                tokio::time::sleep(settle).await;
            }
            // The gate may have closed while settling.
            if gate.borrow().is_open() {
                tracing::debug!(sentinel = %token.sentinel, "Advance emitted");
                let _ = tx.send(token);
            }
        }));

        true
    }
}

impl Drop for ScrollTrigger {
    fn drop(&mut self) {
        self.detach();
    }
}
