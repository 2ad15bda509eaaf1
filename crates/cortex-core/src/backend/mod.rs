//! Data-access seam between the client state machines and the remote
//! orchestrator.
//!
//! Everything above this trait (session sync, explorer, console) is written
//! against `dyn OrchestratorBackend`, so tests drive the state machines
//! with scripted backends and the credential-less case is an explicit
//! [`NullBackend`] rather than a silently substituted stub.

mod http;
mod null;

pub use http::HttpBackend;
pub use null::NullBackend;

use crate::error::Result;
use crate::models::{
    BackupResponse, FileNode, HealthStatus, Message, PdfIngestRequest, PdfIngestResponse,
    QueryRequest, QueryResponse, RepoIngestRequest, RepoJob, SaveFileRequest, Session,
    SyncDirection, SystemMode, SystemStatus, Task,
};
use async_trait::async_trait;

/// Every orchestrator endpoint the client consumes.
#[async_trait]
pub trait OrchestratorBackend: Send + Sync {
    // Chat
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse>;

    // Roadmap
    async fn tasks(&self, session_id: Option<&str>) -> Result<Vec<Task>>;

    // Sessions
    async fn sessions(&self) -> Result<Vec<Session>>;
    async fn session_history(&self, session_id: &str) -> Result<Vec<Message>>;
    async fn clone_session(&self, session_id: &str) -> Result<String>;
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    // Knowledge / ingestion
    async fn ingest_list(&self, session_id: Option<&str>) -> Result<Vec<RepoJob>>;
    async fn ingest_repo(&self, request: &RepoIngestRequest) -> Result<()>;
    async fn ingest_pdf(&self, request: &PdfIngestRequest) -> Result<PdfIngestResponse>;

    // Repository browsing
    async fn repo_files(&self, repo_name: &str, path: &str) -> Result<Vec<FileNode>>;
    async fn file_content(&self, repo_name: &str, path: &str) -> Result<String>;
    async fn save_file(&self, request: &SaveFileRequest) -> Result<()>;

    // System
    async fn health(&self) -> Result<HealthStatus>;
    async fn system_status(&self) -> Result<SystemStatus>;
    async fn set_system_mode(&self, mode: SystemMode) -> Result<()>;
    async fn trigger_sync(&self, direction: SyncDirection) -> Result<()>;
    async fn trigger_backup(&self) -> Result<BackupResponse>;
}
