//! Confirmation Gate for destructive history operations.
//!
//! The gate is the only path to `HistoryStore::delete_entry` and
//! `HistoryStore::clear_all`. A request parks the action until the user
//! confirms or cancels; a newer request replaces a pending one.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::HistoryApi;
use crate::managers::history_store::HistoryStore;
use crate::types::confirmation::{ConfirmAction, ConfirmationRequest, GateState, Notification};

const FAILURE_MESSAGE: &str = "Operation failed. Please try again.";

/// Two-state machine guarding delete-one and clear-all.
pub struct ConfirmationGate<A: HistoryApi> {
    store: Arc<HistoryStore<A>>,
    state: GateState,
}

impl<A: HistoryApi> ConfirmationGate<A> {
    pub fn new(store: Arc<HistoryStore<A>>) -> Self {
        Self {
            store,
            state: GateState::Idle,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self.state, GateState::AwaitingConfirmation(_))
    }

    /// Dialog view of the current state.
    pub fn request(&self) -> ConfirmationRequest {
        ConfirmationRequest::from(&self.state)
    }

    /// Asks for confirmation before deleting `id`. Replaces any pending request.
    pub fn request_delete(&mut self, id: impl Into<String>) {
        let target_id = id.into();
        debug!(id = %target_id, "delete awaiting confirmation");
        self.state = GateState::AwaitingConfirmation(ConfirmAction::Delete { target_id });
    }

    /// Asks for confirmation before clearing all history. Replaces any pending request.
    pub fn request_clear(&mut self) {
        debug!("clear awaiting confirmation");
        self.state = GateState::AwaitingConfirmation(ConfirmAction::Clear);
    }

    /// Runs the pending action and returns the notification to show.
    ///
    /// Returns `None` without touching the store when nothing is pending.
    /// The gate is back to idle afterwards, whether or not the action succeeded.
    pub async fn confirm(&mut self) -> Option<Notification> {
        let action = match &self.state {
            GateState::Idle => {
                debug!("confirm ignored: nothing pending");
                return None;
            }
            GateState::AwaitingConfirmation(action) => action.clone(),
        };

        let result = match &action {
            ConfirmAction::Delete { target_id } => self.store.delete_entry(target_id).await,
            ConfirmAction::Clear => self.store.clear_all().await,
        };
        self.state = GateState::Idle;

        Some(match result {
            Ok(()) => {
                info!(action = action.title(), "confirmed action completed");
                Notification::success(action.success_message())
            }
            Err(e) => {
                warn!(action = action.title(), error = %e, "confirmed action failed");
                Notification::error(FAILURE_MESSAGE)
            }
        })
    }

    /// Drops the pending request. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        let was_pending = self.is_awaiting();
        if was_pending {
            debug!("confirmation cancelled");
        }
        self.state = GateState::Idle;
        was_pending
    }
}
