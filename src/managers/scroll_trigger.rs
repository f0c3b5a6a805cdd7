//! Infinite scroll trigger for the history list.
//!
//! The rendering layer reports the intersection ratio of a sentinel placed
//! after the last rendered entry. A [`SentinelObserver`] turns those reports
//! into at most one `load_next_page` call per "became visible" edge.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::api::HistoryApi;
use crate::managers::history_store::HistoryStore;
use crate::types::errors::HistoryError;

/// What a single intersection report did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// The sentinel became visible and the next page was requested.
    Triggered,
    /// The sentinel became visible but no page was requested, usually
    /// because a load or mutation was in flight.
    Suppressed,
    /// No rising edge: still visible, or not visible.
    Ignored,
    /// No more pages; the observer should be dropped.
    Exhausted,
}

/// Hands out sentinel observations for one history store.
pub struct InfiniteScroll<A: HistoryApi> {
    store: Arc<HistoryStore<A>>,
    threshold: f64,
    active: Arc<AtomicUsize>,
}

impl<A: HistoryApi> InfiniteScroll<A> {
    /// `threshold` is the intersection ratio at which the sentinel counts as visible.
    pub fn new(store: Arc<HistoryStore<A>>, threshold: f64) -> Self {
        Self {
            store,
            threshold,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Starts observing the sentinel. Returns `None` when there is nothing
    /// more to load.
    pub fn observe(&self) -> Option<SentinelObserver<A>> {
        if !self.store.has_more() {
            return None;
        }
        self.active.fetch_add(1, Ordering::SeqCst);
        debug!("sentinel observation started");
        Some(SentinelObserver {
            store: Arc::clone(&self.store),
            threshold: self.threshold,
            was_visible: false,
            active: Arc::clone(&self.active),
        })
    }

    /// Number of observations not yet released.
    pub fn active_observers(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// A live observation of the sentinel. Dropping it releases the observation.
pub struct SentinelObserver<A: HistoryApi> {
    store: Arc<HistoryStore<A>>,
    threshold: f64,
    was_visible: bool,
    active: Arc<AtomicUsize>,
}

impl<A: HistoryApi> SentinelObserver<A> {
    /// False once the store has no more pages; the owner should drop it then.
    pub fn is_live(&self) -> bool {
        self.store.has_more()
    }

    /// Handles one intersection report.
    pub async fn on_intersection(&mut self, ratio: f64) -> Result<TriggerOutcome, HistoryError> {
        let visible = ratio >= self.threshold;
        let rising = visible && !self.was_visible;
        self.was_visible = visible;

        if !self.store.has_more() {
            return Ok(TriggerOutcome::Exhausted);
        }
        if !rising {
            return Ok(TriggerOutcome::Ignored);
        }
        if self.store.is_busy() {
            // Keep the edge armed so the first report after the store settles fires.
            self.was_visible = false;
            debug!("sentinel visible while store busy");
            return Ok(TriggerOutcome::Suppressed);
        }

        debug!(ratio, "sentinel visible, loading next page");
        if self.store.load_next_page().await? {
            Ok(TriggerOutcome::Triggered)
        } else {
            self.was_visible = false;
            debug!("next page not requested, edge stays armed");
            Ok(TriggerOutcome::Suppressed)
        }
    }
}

impl<A: HistoryApi> Drop for SentinelObserver<A> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        debug!("sentinel observation released");
    }
}
