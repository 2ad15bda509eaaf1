//! Explicit no-op backend for running without an orchestrator.
//!
//! Read operations return empty collections so the UI renders its empty
//! states; anything that would mutate remote state reports
//! `BackendUnavailable` instead of pretending to succeed.

use super::OrchestratorBackend;
use crate::error::{CortexError, Result};
use crate::models::{
    BackupResponse, FileNode, HealthStatus, Message, PdfIngestRequest, PdfIngestResponse,
    QueryRequest, QueryResponse, RepoIngestRequest, RepoJob, SaveFileRequest, Session,
    SyncDirection, SystemMode, SystemStatus, Task,
};
use async_trait::async_trait;

#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl NullBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OrchestratorBackend for NullBackend {
    async fn query(&self, _request: &QueryRequest) -> Result<QueryResponse> {
        Err(CortexError::BackendUnavailable)
    }

    async fn tasks(&self, _session_id: Option<&str>) -> Result<Vec<Task>> {
        Ok(Vec::new())
    }

    async fn sessions(&self) -> Result<Vec<Session>> {
        Ok(Vec::new())
    }

    async fn session_history(&self, _session_id: &str) -> Result<Vec<Message>> {
        Ok(Vec::new())
    }

    async fn clone_session(&self, _session_id: &str) -> Result<String> {
        Err(CortexError::BackendUnavailable)
    }

    async fn delete_session(&self, _session_id: &str) -> Result<()> {
        Err(CortexError::BackendUnavailable)
    }

    async fn ingest_list(&self, _session_id: Option<&str>) -> Result<Vec<RepoJob>> {
        Ok(Vec::new())
    }

    async fn ingest_repo(&self, _request: &RepoIngestRequest) -> Result<()> {
        Err(CortexError::BackendUnavailable)
    }

    async fn ingest_pdf(&self, _request: &PdfIngestRequest) -> Result<PdfIngestResponse> {
        Err(CortexError::BackendUnavailable)
    }

    async fn repo_files(&self, _repo_name: &str, _path: &str) -> Result<Vec<FileNode>> {
        Ok(Vec::new())
    }

    async fn file_content(&self, _repo_name: &str, _path: &str) -> Result<String> {
        Err(CortexError::BackendUnavailable)
    }

    async fn save_file(&self, _request: &SaveFileRequest) -> Result<()> {
        Err(CortexError::BackendUnavailable)
    }

    async fn health(&self) -> Result<HealthStatus> {
        Ok(HealthStatus { status: None })
    }

    async fn system_status(&self) -> Result<SystemStatus> {
        Ok(SystemStatus {
            mode: SystemMode::Local,
        })
    }

    async fn set_system_mode(&self, _mode: SystemMode) -> Result<()> {
        Err(CortexError::BackendUnavailable)
    }

    async fn trigger_sync(&self, _direction: SyncDirection) -> Result<()> {
        Err(CortexError::BackendUnavailable)
    }

    async fn trigger_backup(&self) -> Result<BackupResponse> {
        Err(CortexError::BackendUnavailable)
    }
}
