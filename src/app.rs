//! App Core for SkillForge.
//!
//! Central struct wiring the session, the history view and the tool services
//! around one shared [`ApiClient`].

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::managers::confirmation_gate::ConfirmationGate;
use crate::managers::history_store::HistoryStore;
use crate::managers::scroll_trigger::{InfiniteScroll, SentinelObserver, TriggerOutcome};
use crate::managers::session_manager::SessionManager;
use crate::platform;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::tools_service::ToolsService;
use crate::services::usage_service::UsageService;
use crate::types::errors::HistoryError;
use crate::types::history::HistorySnapshot;

/// Central application struct holding all managers and services.
///
/// Connection settings (`api_base_url`, timeouts, page size) are read once
/// here; edits made through the settings engine apply on the next start.
pub struct App {
    pub settings_engine: SettingsEngine,
    pub api: Arc<ApiClient>,
    pub session_manager: SessionManager,
    pub history: Arc<HistoryStore<ApiClient>>,
    pub gate: ConfirmationGate<ApiClient>,
    pub scroll: InfiniteScroll<ApiClient>,
    pub tools: ToolsService,
    pub usage: UsageService,
    preview_chars: usize,
    observer: Option<SentinelObserver<ApiClient>>,
}

impl App {
    /// Creates the app from the settings at `config_path` (platform default when `None`).
    ///
    /// The history view starts unmounted.
    pub fn new(config_path: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings_engine = SettingsEngine::new(config_path);
        let settings = settings_engine.load()?;

        let api = Arc::new(ApiClient::new(&settings));
        let session_file = settings
            .session_file
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(platform::default_session_file);
        let session_manager = SessionManager::new(Arc::clone(&api), session_file);

        let history = Arc::new(HistoryStore::new(Arc::clone(&api), settings.history_page_size));
        history.unmount();
        let gate = ConfirmationGate::new(Arc::clone(&history));
        let scroll = InfiniteScroll::new(Arc::clone(&history), settings.scroll_threshold);

        info!(api = %api.base_url(), page_size = settings.history_page_size, "app initialized");

        Ok(Self {
            tools: ToolsService::new(Arc::clone(&api)),
            usage: UsageService::new(Arc::clone(&api)),
            settings_engine,
            api,
            session_manager,
            history,
            gate,
            scroll,
            preview_chars: settings.preview_chars,
            observer: None,
        })
    }

    /// Restores a saved session, if any. Failure leaves the app signed out.
    pub async fn startup(&mut self) {
        match self.session_manager.restore().await {
            Ok(Some(user)) => info!(user = user.display_name(), "session restored on startup"),
            Ok(None) => debug!("no saved session"),
            Err(e) => warn!(error = %e, "session restore failed"),
        }
    }

    pub fn preview_chars(&self) -> usize {
        self.preview_chars
    }

    /// Opens the history view and loads its first page.
    pub async fn mount_history(&mut self) -> Result<HistorySnapshot, HistoryError> {
        self.observer = None;
        self.history.mount();
        let result = self.history.load_first_page().await;
        self.sync_observer();
        result.map(|_| self.history.snapshot())
    }

    /// Closes the history view, discarding the collection and any pending confirmation.
    pub fn unmount_history(&mut self) {
        self.observer = None;
        self.gate.cancel();
        self.history.unmount();
    }

    /// Reloads from offset 0, keeping the view open.
    pub async fn refresh_history(&mut self) -> Result<HistorySnapshot, HistoryError> {
        let result = self.history.refresh().await;
        self.sync_observer();
        result.map(|_| self.history.snapshot())
    }

    pub async fn load_more_history(&mut self) -> Result<HistorySnapshot, HistoryError> {
        let result = self.history.load_next_page().await;
        self.sync_observer();
        result.map(|_| self.history.snapshot())
    }

    /// Feeds one sentinel intersection report to the live observer.
    pub async fn intersect(&mut self, ratio: f64) -> Result<TriggerOutcome, HistoryError> {
        self.sync_observer();
        let outcome = match self.observer.as_mut() {
            Some(observer) => observer.on_intersection(ratio).await,
            None => Ok(TriggerOutcome::Exhausted),
        };
        self.sync_observer();
        outcome
    }

    /// Runs the pending confirmation, keeping the sentinel observation in step.
    pub async fn confirm(&mut self) -> Option<crate::types::confirmation::Notification> {
        let notification = self.gate.confirm().await;
        self.sync_observer();
        notification
    }

    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }

    /// Drops the observer once there is nothing more to load and starts a new
    /// one when more pages appear again.
    fn sync_observer(&mut self) {
        if !self.history.is_mounted() {
            self.observer = None;
            return;
        }
        match &self.observer {
            Some(observer) if !observer.is_live() => {
                debug!("no more history pages, releasing sentinel");
                self.observer = None;
            }
            Some(_) => {}
            None => self.observer = self.scroll.observe(),
        }
    }
}
