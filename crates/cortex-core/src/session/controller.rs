//! Keeps the displayed {messages, tasks, repositories} triple consistent
//! with a backend session whose id can change at any moment.
//!
//! The poll loop re-reads the current session id at the instant each tick
//! fires, and every in-flight fetch carries a generation guard taken when
//! it was issued; a response whose generation went stale (new chat, session
//! switch, clone) is discarded instead of overwriting newer state. A
//! captured session id in the poll closure was the bug class this design
//! replaces.

use crate::backend::OrchestratorBackend;
use crate::config::SyncConfig;
use crate::error::{CortexError, Result};
use crate::generation::Generation;
use crate::models::{
    IngestScope, Message, PdfIngestRequest, QueryMode, QueryRequest, RepoIngestRequest, RepoJob,
    Session, SyncDirection, SystemMode, SystemStatus, Task,
};
use crate::network::{AtomicConnectivity, ConnectivityState};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Snapshot of everything a chat view displays.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub messages: Vec<Message>,
    pub tasks: Vec<Task>,
    pub repos: Vec<RepoJob>,
    pub sessions: Vec<Session>,
    /// `None` is a draft chat the backend has not assigned an id to yet.
    pub current_session_id: Option<String>,
    pub show_session_panel: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            tasks: Vec::new(),
            repos: Vec::new(),
            sessions: Vec::new(),
            current_session_id: None,
            show_session_panel: true,
        }
    }
}

/// What gets attached to every query besides its text.
#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub model: String,
    pub provider: String,
    pub rag_mode: Option<String>,
    /// Expanded repository, sent as retrieval context.
    pub repo_context: Option<String>,
    pub system_mode: SystemMode,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            model: SyncConfig::DEFAULT_MODEL.to_string(),
            provider: SyncConfig::DEFAULT_PROVIDER.to_string(),
            rag_mode: None,
            repo_context: None,
            system_mode: SystemMode::Local,
        }
    }
}

/// Drives periodic refresh and all session operations.
pub struct SessionSyncController {
    backend: Arc<dyn OrchestratorBackend>,
    state: RwLock<ViewState>,
    settings: RwLock<QuerySettings>,
    generation: Generation,
    connectivity: AtomicConnectivity,
    viewport_cols: AtomicU32,
    polling_active: AtomicBool,
    revision: AtomicU64,
    changed: watch::Sender<u64>,
}

impl SessionSyncController {
    pub fn new(backend: Arc<dyn OrchestratorBackend>) -> Self {
        let (changed, _) = watch::channel(0);
        Self {
            backend,
            state: RwLock::new(ViewState::default()),
            settings: RwLock::new(QuerySettings::default()),
            generation: Generation::new(),
            connectivity: AtomicConnectivity::new(),
            viewport_cols: AtomicU32::new(u32::MAX),
            polling_active: AtomicBool::new(false),
            revision: AtomicU64::new(0),
            changed,
        }
    }

    // === Accessors ===

    pub fn snapshot(&self) -> ViewState {
        self.state.read().expect("state lock poisoned").clone()
    }

    pub fn current_session_id(&self) -> Option<String> {
        self.state
            .read()
            .expect("state lock poisoned")
            .current_session_id
            .clone()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.connectivity.load()
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    pub fn settings(&self) -> QuerySettings {
        self.settings.read().expect("settings lock poisoned").clone()
    }

    pub fn update_settings(&self, update: impl FnOnce(&mut QuerySettings)) {
        update(&mut self.settings.write().expect("settings lock poisoned"));
        self.touch();
    }

    pub fn set_viewport_cols(&self, cols: u32) {
        self.viewport_cols.store(cols, Ordering::SeqCst);
    }

    pub fn set_session_panel_visible(&self, visible: bool) {
        self.state
            .write()
            .expect("state lock poisoned")
            .show_session_panel = visible;
        self.touch();
    }

    /// Receiver bumped on every state change; the shell watches it to
    /// re-render.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changed.subscribe()
    }

    // === Session lifecycle ===

    /// Clear the transcript and return to a draft chat.
    pub async fn new_chat(&self) {
        self.set_current(None);
        {
            let mut state = self.state.write().expect("state lock poisoned");
            state.messages.clear();
            state.tasks.clear();
            state.repos.clear();
        }
        self.touch();
        // Fire-and-forget: a failing list refresh never blocks a new chat.
        if let Err(e) = self.refresh_sessions().await {
            debug!("Session list refresh failed: {}", e);
        }
    }

    /// Bind to an existing session and replace the transcript with its
    /// history.
    pub async fn select_session(&self, session_id: &str) {
        self.set_current(Some(session_id.to_string()));
        let guard = self.generation.guard();

        match self.backend.session_history(session_id).await {
            Ok(history) => {
                if guard.is_current() {
                    // Wholesale replacement, no incremental merge.
                    self.state.write().expect("state lock poisoned").messages = history;
                    self.touch();
                }
            }
            Err(e) => {
                self.note_connectivity(&e);
                self.push_system(format!("Error: failed to load session history: {}", e));
            }
        }

        if self.viewport_cols.load(Ordering::SeqCst) < SyncConfig::COMPACT_VIEWPORT_COLS {
            self.set_session_panel_visible(false);
        }

        if let Err(e) = self.sync_session_data().await {
            debug!("Post-select data refresh failed: {}", e);
        }
    }

    /// Fork a session on the backend and switch to the fork.
    pub async fn clone_session(&self, session_id: &str) -> Result<String> {
        let new_id = self.backend.clone_session(session_id).await?;
        info!("Cloned session {} -> {}", session_id, new_id);
        if let Err(e) = self.refresh_sessions().await {
            debug!("Session list refresh failed: {}", e);
        }
        self.select_session(&new_id).await;
        Ok(new_id)
    }

    /// Delete a session remotely; deleting the active one drops back to a
    /// draft chat.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.backend.delete_session(session_id).await?;
        if self.current_session_id().as_deref() == Some(session_id) {
            self.new_chat().await;
        } else if let Err(e) = self.refresh_sessions().await {
            debug!("Session list refresh failed: {}", e);
        }
        Ok(())
    }

    /// Re-fetch the session list.
    pub async fn refresh_sessions(&self) -> Result<()> {
        let sessions = self.backend.sessions().await.map_err(|e| {
            self.note_connectivity(&e);
            e
        })?;
        self.state.write().expect("state lock poisoned").sessions = sessions;
        self.touch();
        Ok(())
    }

    // === Chat ===

    /// Send a user message. The optimistic transcript entry always lands
    /// before the network call is issued; failures surface as inline
    /// system messages, never as an error the caller must handle.
    pub async fn send_message(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.push_message(Message::user(text));

        let settings = self.settings();
        let request = QueryRequest {
            query_text: text.to_string(),
            pdf_id: "all".to_string(),
            mode: if settings.system_mode == SystemMode::Cloud {
                QueryMode::Swarm
            } else {
                QueryMode::Standard
            },
            session_id: self.current_session_id(),
            model: Some(settings.model.clone()),
            provider: Some(settings.provider.clone()),
            repo_context: settings.repo_context.clone(),
            rag_mode: settings.rag_mode.clone(),
        };

        match self.backend.query(&request).await {
            Ok(response) => {
                self.set_connectivity(ConnectivityState::Online);

                // Draft -> active: adopt the id the backend assigned.
                if let Some(new_id) = response.session_id.clone() {
                    if self.current_session_id().as_deref() != Some(new_id.as_str()) {
                        self.set_current(Some(new_id));
                        if let Err(e) = self.refresh_sessions().await {
                            debug!("Session list refresh failed: {}", e);
                        }
                    }
                }

                let label = response.model_label(&settings.model, &settings.provider);
                let content = response
                    .answer
                    .clone()
                    .unwrap_or_else(|| "I processed that but have no specific answer.".to_string());
                self.push_message(Message::assistant(
                    content,
                    response.sources.clone(),
                    Some(label),
                ));

                if response.tasks.is_some() {
                    if let Err(e) = self.sync_session_data().await {
                        debug!("Task refresh after answer failed: {}", e);
                    }
                }
            }
            Err(e) => {
                self.note_connectivity(&e);
                self.push_system(format!("Error: {}", e));
            }
        }
    }

    // === Knowledge / ingestion ===

    /// Queue a repository for ingestion, narrating progress in the
    /// transcript.
    pub async fn ingest_repo(&self, url: &str, scope: IngestScope) {
        let url = url.trim();
        if url.is_empty() {
            return;
        }
        self.push_system(format!("INGESTION INITIATED: {}", url));

        let request = RepoIngestRequest {
            url: url.to_string(),
            scope,
            session_id: self.current_session_id(),
        };
        match self.backend.ingest_repo(&request).await {
            Ok(()) => {
                self.push_system("INGESTION QUEUED.");
                if let Err(e) = self.sync_session_data().await {
                    debug!("Post-ingest refresh failed: {}", e);
                }
            }
            Err(e) => {
                self.note_connectivity(&e);
                self.push_system(format!("INGESTION FAILED: {}", e));
            }
        }
    }

    /// Queue a PDF for ingestion. Returns the stored document URL when the
    /// backend reports one, for the viewer to open. Failures are narrated
    /// inline.
    pub async fn ingest_pdf(
        &self,
        url: &str,
        scope: IngestScope,
        rag_mode: Option<String>,
        page_offset: Option<i32>,
        enable_ocr: bool,
    ) -> Option<String> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        self.push_system(format!("INGESTION INITIATED: {}", url));

        let request = PdfIngestRequest {
            url: url.to_string(),
            scope,
            session_id: self.current_session_id(),
            rag_mode,
            page_offset,
            enable_ocr,
        };
        match self.backend.ingest_pdf(&request).await {
            Ok(response) => {
                if let Some(new_id) = response.session_id.clone() {
                    if self.current_session_id().as_deref() != Some(new_id.as_str()) {
                        self.set_current(Some(new_id));
                    }
                }
                self.push_system("INGESTION QUEUED.");
                response.file_url
            }
            Err(e) => {
                self.note_connectivity(&e);
                self.push_system(format!("INGESTION FAILED: {}", e));
                None
            }
        }
    }

    // === System ===

    /// Liveness probe against the backend's health endpoint.
    pub async fn health(&self) -> Result<()> {
        match self.backend.health().await {
            Ok(_) => {
                self.set_connectivity(ConnectivityState::Online);
                Ok(())
            }
            Err(e) => {
                self.note_connectivity(&e);
                Err(e)
            }
        }
    }

    pub async fn system_status(&self) -> Result<SystemStatus> {
        let status = self.backend.system_status().await?;
        self.update_settings(|s| s.system_mode = status.mode);
        Ok(status)
    }

    /// Flip LOCAL <-> CLOUD. The backend requires a restart afterwards.
    pub async fn switch_mode(&self) -> Result<SystemMode> {
        let next = self.settings().system_mode.toggled();
        self.backend.set_system_mode(next).await?;
        self.update_settings(|s| s.system_mode = next);
        Ok(next)
    }

    pub async fn trigger_sync(&self, direction: SyncDirection) -> Result<()> {
        self.backend.trigger_sync(direction).await
    }

    pub async fn trigger_backup(&self) -> Result<Option<String>> {
        Ok(self.backend.trigger_backup().await?.path)
    }

    // === Polling ===

    /// One poll body: re-fetch tasks and repositories scoped to the session
    /// current at call time, discarding the result if the session changed
    /// while the fetch was in flight.
    pub async fn sync_session_data(&self) -> Result<()> {
        let session_id = self.current_session_id();
        let guard = self.generation.guard();

        let sid = session_id.as_deref();
        let (tasks, repos) =
            tokio::join!(self.backend.tasks(sid), self.backend.ingest_list(sid));
        let tasks = tasks?;
        let repos = repos?;

        guard.check()?;

        {
            let mut state = self.state.write().expect("state lock poisoned");
            state.tasks = tasks;
            state.repos = repos;
        }
        self.touch();
        Ok(())
    }

    /// Background tick: silent by contract. Connectivity failures flip the
    /// offline indicator and leave displayed data alone; stale results are
    /// dropped without comment.
    pub async fn poll_tick(&self) {
        match self.sync_session_data().await {
            Ok(()) => self.set_connectivity(ConnectivityState::Online),
            Err(e) if e.is_stale() => {
                debug!("Dropped stale poll result: {}", e);
            }
            Err(e) if e.is_connectivity() => {
                if self.connectivity.load() != ConnectivityState::Offline {
                    warn!("Backend unreachable, going offline: {}", e);
                }
                self.set_connectivity(ConnectivityState::Offline);
            }
            Err(e) => {
                // The backend answered with an error; it is reachable.
                debug!("Poll returned backend error: {}", e);
                self.set_connectivity(ConnectivityState::Online);
            }
        }
    }

    /// Start the fixed-interval poll loop. The first tick fires
    /// immediately and doubles as the initial load.
    pub fn start_polling(self: &Arc<Self>) {
        if self.polling_active.swap(true, Ordering::SeqCst) {
            debug!("Session polling already active");
            return;
        }
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SyncConfig::POLL_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            while controller.polling_active.load(Ordering::SeqCst) {
                interval.tick().await;
                if !controller.polling_active.load(Ordering::SeqCst) {
                    break;
                }
                controller.poll_tick().await;
            }
            debug!("Session polling stopped");
        });
    }

    pub fn stop_polling(&self) {
        self.polling_active.store(false, Ordering::SeqCst);
    }

    pub fn is_polling(&self) -> bool {
        self.polling_active.load(Ordering::SeqCst)
    }

    // === Internal ===

    /// Change the current session id; bumps the generation synchronously so
    /// in-flight fetches against the previous session go stale.
    fn set_current(&self, session_id: Option<String>) {
        let mut state = self.state.write().expect("state lock poisoned");
        if state.current_session_id != session_id {
            state.current_session_id = session_id;
            self.generation.bump();
            drop(state);
            self.touch();
        }
    }

    fn push_message(&self, message: Message) {
        self.state
            .write()
            .expect("state lock poisoned")
            .messages
            .push(message);
        self.touch();
    }

    fn push_system(&self, content: impl Into<String>) {
        self.push_message(Message::system(content));
    }

    fn set_connectivity(&self, next: ConnectivityState) {
        if self.connectivity.load() != next {
            self.connectivity.store(next);
            self.touch();
        }
    }

    fn note_connectivity(&self, error: &CortexError) {
        if error.is_connectivity() {
            self.set_connectivity(ConnectivityState::Offline);
        }
    }

    fn touch(&self) {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.changed.send(revision);
    }
}
