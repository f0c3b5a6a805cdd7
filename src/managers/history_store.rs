//! History Store for SkillForge.
//!
//! Owns the paginated, in-memory view of the signed-in user's tool usage
//! history and mediates every change to it through the remote [`HistoryApi`].
//!
//! All methods take `&self` so the store can be shared (`Arc`) between the
//! confirmation gate, the scroll trigger, and the rendering bridge. The state
//! lock is never held across a network call; instead every reload is tagged
//! with a generation number and responses from a superseded generation are
//! dropped on arrival.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::HistoryApi;
use crate::types::errors::{ApiError, HistoryError};
use crate::types::history::{HistoryEntry, HistorySnapshot, Page};

#[derive(Debug, Default)]
struct StoreState {
    pages: Vec<Page>,
    generation: u64,
    /// Generation of the offset-0 reload currently on the wire.
    reload_in_flight: Option<u64>,
    loading_more: bool,
    mutating: bool,
    error: Option<String>,
    mounted: bool,
}

impl StoreState {
    fn begin_reload(&mut self) -> u64 {
        self.generation += 1;
        self.reload_in_flight = Some(self.generation);
        self.generation
    }

    fn has_more(&self) -> bool {
        self.pages.last().map_or(false, |p| p.has_more)
    }

    fn contains(&self, id: &str) -> bool {
        self.pages
            .iter()
            .any(|p| p.entries.iter().any(|e| e.id == id))
    }

    /// Drops `id` from the loaded pages and shifts later offsets to match the
    /// server, which has already removed it.
    fn remove_locally(&mut self, id: &str) {
        let mut shifted = false;
        for page in &mut self.pages {
            if shifted {
                page.offset = page.offset.saturating_sub(1);
            }
            let before = page.entries.len();
            page.entries.retain(|e| e.id != id);
            if page.entries.len() < before {
                page.fetched = page.fetched.saturating_sub(1);
                shifted = true;
            }
        }
    }

    fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            entries: self
                .pages
                .iter()
                .flat_map(|p| p.entries.iter().cloned())
                .collect(),
            loading: self.reload_in_flight.is_some(),
            loading_more: self.loading_more,
            mutating: self.mutating,
            error: self.error.clone(),
            has_more: self.has_more(),
        }
    }
}

/// Paginated history collection backed by a remote [`HistoryApi`].
pub struct HistoryStore<A: HistoryApi> {
    api: Arc<A>,
    page_size: usize,
    state: Mutex<StoreState>,
    updates: watch::Sender<HistorySnapshot>,
}

impl<A: HistoryApi> HistoryStore<A> {
    /// Creates a mounted, empty store. A page size of 0 is raised to 1.
    pub fn new(api: Arc<A>, page_size: usize) -> Self {
        let state = StoreState {
            mounted: true,
            ..StoreState::default()
        };
        let (updates, _) = watch::channel(state.snapshot());
        Self {
            api,
            page_size: page_size.max(1),
            state: Mutex::new(state),
            updates,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn publish(&self, state: &StoreState) {
        self.updates.send_replace(state.snapshot());
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Current view for the rendering layer.
    pub fn snapshot(&self) -> HistorySnapshot {
        self.lock().snapshot()
    }

    /// Receives a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<HistorySnapshot> {
        self.updates.subscribe()
    }

    /// Flattened entries across all loaded pages, in server order.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.lock().snapshot().entries
    }

    pub fn page_count(&self) -> usize {
        self.lock().pages.len()
    }

    pub fn has_more(&self) -> bool {
        self.lock().has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().reload_in_flight.is_some()
    }

    pub fn is_loading_more(&self) -> bool {
        self.lock().loading_more
    }

    pub fn is_mutating(&self) -> bool {
        self.lock().mutating
    }

    /// True while any page load or mutation is unresolved.
    pub fn is_busy(&self) -> bool {
        let st = self.lock();
        st.reload_in_flight.is_some() || st.loading_more || st.mutating
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    /// Starts a fresh view: empty collection, no error, responses from any
    /// earlier view discarded.
    pub fn mount(&self) {
        let mut st = self.lock();
        st.generation += 1;
        st.pages.clear();
        st.reload_in_flight = None;
        st.loading_more = false;
        st.error = None;
        st.mounted = true;
        debug!(generation = st.generation, "history view mounted");
        self.publish(&st);
    }

    /// Discards the collection. Responses still on the wire are ignored.
    pub fn unmount(&self) {
        let mut st = self.lock();
        st.generation += 1;
        st.pages.clear();
        st.reload_in_flight = None;
        st.loading_more = false;
        st.error = None;
        st.mounted = false;
        debug!(generation = st.generation, "history view unmounted");
        self.publish(&st);
    }

    /// Loads entries from offset 0, replacing the collection on success.
    ///
    /// On failure the error state is set and previously loaded pages stay.
    /// A call while a first-page load is already pending is a no-op.
    pub async fn load_first_page(&self) -> Result<(), HistoryError> {
        let generation = {
            let mut st = self.lock();
            if !st.mounted {
                return Ok(());
            }
            if st.reload_in_flight.is_some() {
                debug!("first page already loading");
                return Ok(());
            }
            let generation = st.begin_reload();
            self.publish(&st);
            generation
        };
        self.reload(generation).await
    }

    /// Refetches from offset 0, superseding any pending page load.
    ///
    /// No-op while a delete or clear is in flight: the mutation reloads on
    /// its own and must see the result of that reload.
    pub async fn refresh(&self) -> Result<(), HistoryError> {
        let generation = {
            let mut st = self.lock();
            if !st.mounted {
                return Ok(());
            }
            if st.mutating {
                debug!("refresh suppressed: history update in flight");
                return Ok(());
            }
            let generation = st.begin_reload();
            self.publish(&st);
            generation
        };
        self.reload(generation).await
    }

    async fn reload(&self, generation: u64) -> Result<(), HistoryError> {
        debug!(generation, limit = self.page_size, "fetching first history page");
        let result = self.api.fetch_page(self.page_size, 0).await;

        let mut st = self.lock();
        if !st.mounted || st.generation != generation {
            debug!(generation, current = st.generation, "dropping stale first page");
            return Ok(());
        }
        st.reload_in_flight = None;

        let outcome = match result {
            Ok(entries) if entries.len() > self.page_size => {
                let err = HistoryError::ConsistencyViolation(format!(
                    "page of {} entries exceeds limit {}",
                    entries.len(),
                    self.page_size
                ));
                warn!(error = %err, "first page dropped");
                Err(err)
            }
            Ok(entries) => {
                let fetched = entries.len();
                let mut page = Page::new(0, self.page_size, dedupe(entries, &HashSet::new()));
                page.fetched = fetched;
                page.has_more = fetched == self.page_size;
                st.pages = vec![page];
                st.error = None;
                Ok(())
            }
            Err(e) => {
                let err = HistoryError::Fetch(e.to_string());
                warn!(error = %err, "first page load failed");
                st.error = Some(err.to_string());
                Err(err)
            }
        };
        self.publish(&st);
        outcome
    }

    /// Appends the next page. Returns whether a page request was sent.
    ///
    /// No-op (`Ok(false)`) when nothing is loaded yet, when the last page was
    /// short, or while another load or a mutation is in flight.
    pub async fn load_next_page(&self) -> Result<bool, HistoryError> {
        let (generation, offset) = {
            let mut st = self.lock();
            if !st.mounted || st.reload_in_flight.is_some() || st.loading_more || st.mutating {
                debug!("next page suppressed: store busy");
                return Ok(false);
            }
            let offset = match st.pages.last() {
                Some(last) if last.has_more => last.next_offset(),
                _ => return Ok(false),
            };
            st.loading_more = true;
            self.publish(&st);
            (st.generation, offset)
        };

        debug!(offset, limit = self.page_size, "fetching next history page");
        let result = self.api.fetch_page(self.page_size, offset).await;

        let mut st = self.lock();
        st.loading_more = false;
        if !st.mounted || st.generation != generation {
            debug!(offset, "dropping stale next page");
            self.publish(&st);
            return Ok(true);
        }

        let outcome = match result {
            Ok(entries) => {
                let expected = st.pages.last().map_or(0, |p| p.next_offset());
                if entries.len() > self.page_size || expected != offset {
                    let err = HistoryError::ConsistencyViolation(format!(
                        "page at offset {} ({} entries) does not fit collection ending at {}",
                        offset,
                        entries.len(),
                        expected
                    ));
                    warn!(error = %err, "next page dropped");
                    Err(err)
                } else {
                    let fetched = entries.len();
                    let known: HashSet<String> = st
                        .pages
                        .iter()
                        .flat_map(|p| p.entries.iter().map(|e| e.id.clone()))
                        .collect();
                    let mut page = Page::new(offset, self.page_size, dedupe(entries, &known));
                    page.fetched = fetched;
                    page.has_more = fetched == self.page_size;
                    st.pages.push(page);
                    st.error = None;
                    Ok(true)
                }
            }
            Err(e) => {
                let err = HistoryError::Fetch(e.to_string());
                warn!(error = %err, offset, "next page load failed");
                st.error = Some(err.to_string());
                Err(err)
            }
        };
        self.publish(&st);
        outcome
    }

    /// Deletes one entry remotely, then reloads the collection from offset 0.
    ///
    /// Only reachable through the confirmation gate.
    pub(crate) async fn delete_entry(&self, id: &str) -> Result<(), HistoryError> {
        self.begin_mutation()?;

        match self.api.delete_one(id).await {
            Ok(()) => {
                info!(id, "history entry deleted");
                self.reload_after_mutation(id).await;
                Ok(())
            }
            Err(ApiError::NotFound(msg)) => {
                // Already gone on the server; resync so it stops showing here.
                warn!(id, "history entry not found on delete");
                self.reload_after_mutation(id).await;
                Err(HistoryError::Mutation(ApiError::NotFound(msg).to_string()))
            }
            Err(e) => {
                warn!(id, error = %e, "history delete failed");
                self.end_mutation();
                Err(HistoryError::Mutation(e.to_string()))
            }
        }
    }

    /// Clears all history remotely, then empties the collection without a reload.
    ///
    /// Only reachable through the confirmation gate.
    pub(crate) async fn clear_all(&self) -> Result<(), HistoryError> {
        self.begin_mutation()?;

        let result = self.api.clear_all().await;

        let mut st = self.lock();
        st.mutating = false;
        let outcome = match result {
            Ok(()) => {
                if st.mounted {
                    st.generation += 1;
                    st.reload_in_flight = None;
                    st.pages.clear();
                    st.error = None;
                }
                info!("history cleared");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "history clear failed");
                Err(HistoryError::Mutation(e.to_string()))
            }
        };
        self.publish(&st);
        outcome
    }

    fn begin_mutation(&self) -> Result<(), HistoryError> {
        let mut st = self.lock();
        if st.mutating {
            return Err(HistoryError::Mutation(
                "another history update is in progress".to_string(),
            ));
        }
        st.mutating = true;
        self.publish(&st);
        Ok(())
    }

    fn end_mutation(&self) {
        let mut st = self.lock();
        st.mutating = false;
        self.publish(&st);
    }

    async fn reload_after_mutation(&self, deleted_id: &str) {
        let generation = {
            let mut st = self.lock();
            if !st.mounted {
                st.mutating = false;
                self.publish(&st);
                return;
            }
            let generation = st.begin_reload();
            self.publish(&st);
            generation
        };

        let reloaded = self.reload(generation).await;

        let mut st = self.lock();
        st.mutating = false;
        // A superseded reload reports Ok without having replaced the pages.
        let landed = reloaded.is_ok() && st.generation == generation;
        if !landed && st.mounted && st.contains(deleted_id) {
            debug!(id = deleted_id, "reload did not land, removing deleted entry locally");
            st.remove_locally(deleted_id);
        }
        self.publish(&st);
    }
}

/// Drops entries whose id is already present, logging each one.
fn dedupe(entries: Vec<HistoryEntry>, known: &HashSet<String>) -> Vec<HistoryEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| {
            let fresh = !known.contains(&e.id) && seen.insert(e.id.clone());
            if !fresh {
                warn!(id = %e.id, "duplicate history entry skipped");
            }
            fresh
        })
        .collect()
}
