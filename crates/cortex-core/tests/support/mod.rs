//! Scripted backend for driving the state machines without a network.

// Each integration test binary uses a different subset of this module.
#![allow(dead_code)]

use async_trait::async_trait;
use cortex_core::error::{CortexError, Result};
use cortex_core::models::{
    BackupResponse, FileNode, HealthStatus, Message, PdfIngestRequest, PdfIngestResponse,
    QueryRequest, QueryResponse, RepoIngestRequest, RepoJob, SaveFileRequest, Session,
    SyncDirection, SystemMode, SystemStatus, Task,
};
use cortex_core::OrchestratorBackend;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// One-shot gate: the first gated call signals `started`, then blocks until
/// `release` fires.
pub struct Gate {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl Gate {
    pub fn new() -> (Self, Arc<Notify>, Arc<Notify>) {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        (
            Self {
                started: started.clone(),
                release: release.clone(),
            },
            started,
            release,
        )
    }
}

/// In-memory backend whose responses tests script up front.
#[derive(Default)]
pub struct MockBackend {
    pub sessions: Mutex<Vec<Session>>,
    pub histories: Mutex<HashMap<String, Vec<Message>>>,
    /// Keyed by session id; `""` is the draft/global scope.
    pub tasks: Mutex<HashMap<String, Vec<Task>>>,
    pub repos: Mutex<HashMap<String, Vec<RepoJob>>>,
    pub files: Mutex<HashMap<(String, String), Vec<FileNode>>>,
    pub contents: Mutex<HashMap<(String, String), String>>,
    pub query_responses: Mutex<VecDeque<QueryResponse>>,
    /// Makes task/repo fetches fail like a dead network.
    pub fail_polls: AtomicBool,
    /// Session ids the task endpoint was asked about, in order.
    pub task_fetches: Mutex<Vec<String>>,
    /// One-shot gate applied to the next task fetch.
    pub tasks_gate: Mutex<Option<Gate>>,
    pub saved_files: Mutex<Vec<SaveFileRequest>>,
    pub ingested_repos: Mutex<Vec<RepoIngestRequest>>,
    pub deleted_sessions: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(id: &str) -> Session {
        Session {
            id: id.to_string(),
            title: Some(format!("Chat {}", id)),
            created_at: None,
        }
    }

    pub fn task(id: &str, title: &str) -> Task {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": title,
            "status": "PENDING",
            "assigned_agent": "architect",
        }))
        .unwrap()
    }

    pub fn repo(id: &str, name: &str) -> RepoJob {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "path": "",
            "status": "DONE",
        }))
        .unwrap()
    }

    pub fn file(name: &str, path: &str, kind: &str) -> FileNode {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "path": path,
            "type": kind,
        }))
        .unwrap()
    }

    pub fn push_query_response(&self, response: QueryResponse) {
        self.query_responses
            .lock()
            .unwrap()
            .push_back(response);
    }

    pub fn answer(text: &str, session_id: Option<&str>) -> QueryResponse {
        serde_json::from_value(serde_json::json!({
            "answer": text,
            "session_id": session_id,
        }))
        .unwrap()
    }

    fn poll_failure() -> CortexError {
        CortexError::Network {
            message: "connection refused".to_string(),
            source: None,
        }
    }
}

#[async_trait]
impl OrchestratorBackend for MockBackend {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let response = self
            .query_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Self::answer(&format!("echo: {}", request.query_text), None));
        // The backend creates the session it assigns.
        if let Some(id) = &response.session_id {
            let mut sessions = self.sessions.lock().unwrap();
            if !sessions.iter().any(|s| &s.id == id) {
                sessions.push(Self::session(id));
            }
        }
        Ok(response)
    }

    async fn tasks(&self, session_id: Option<&str>) -> Result<Vec<Task>> {
        let key = session_id.unwrap_or("").to_string();
        self.task_fetches.lock().unwrap().push(key.clone());

        let gate = self.tasks_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }

        if self.fail_polls.load(Ordering::SeqCst) {
            return Err(Self::poll_failure());
        }
        Ok(self.tasks.lock().unwrap().get(&key).cloned().unwrap_or_default())
    }

    async fn sessions(&self) -> Result<Vec<Session>> {
        Ok(self.sessions.lock().unwrap().clone())
    }

    async fn session_history(&self, session_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .histories
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn clone_session(&self, session_id: &str) -> Result<String> {
        let new_id = format!("{}-clone", session_id);
        self.sessions.lock().unwrap().push(Self::session(&new_id));
        Ok(new_id)
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.deleted_sessions
            .lock()
            .unwrap()
            .push(session_id.to_string());
        self.sessions.lock().unwrap().retain(|s| s.id != session_id);
        Ok(())
    }

    async fn ingest_list(&self, session_id: Option<&str>) -> Result<Vec<RepoJob>> {
        if self.fail_polls.load(Ordering::SeqCst) {
            return Err(Self::poll_failure());
        }
        let key = session_id.unwrap_or("").to_string();
        Ok(self.repos.lock().unwrap().get(&key).cloned().unwrap_or_default())
    }

    async fn ingest_repo(&self, request: &RepoIngestRequest) -> Result<()> {
        self.ingested_repos.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn ingest_pdf(&self, request: &PdfIngestRequest) -> Result<PdfIngestResponse> {
        Ok(PdfIngestResponse {
            session_id: request.session_id.clone(),
            file_url: Some(format!("{}#stored", request.url)),
        })
    }

    async fn repo_files(&self, repo_name: &str, path: &str) -> Result<Vec<FileNode>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(&(repo_name.to_string(), path.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn file_content(&self, repo_name: &str, path: &str) -> Result<String> {
        self.contents
            .lock()
            .unwrap()
            .get(&(repo_name.to_string(), path.to_string()))
            .cloned()
            .ok_or(CortexError::Backend {
                status: 404,
                detail: "File not found".to_string(),
            })
    }

    async fn save_file(&self, request: &SaveFileRequest) -> Result<()> {
        self.saved_files.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn health(&self) -> Result<HealthStatus> {
        Ok(HealthStatus {
            status: Some("ok".to_string()),
        })
    }

    async fn system_status(&self) -> Result<SystemStatus> {
        Ok(SystemStatus {
            mode: SystemMode::Local,
        })
    }

    async fn set_system_mode(&self, _mode: SystemMode) -> Result<()> {
        Ok(())
    }

    async fn trigger_sync(&self, _direction: SyncDirection) -> Result<()> {
        Ok(())
    }

    async fn trigger_backup(&self) -> Result<BackupResponse> {
        Ok(BackupResponse {
            path: Some("/tmp/backup.db".to_string()),
        })
    }
}
