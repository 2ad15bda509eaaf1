//! reqwest-backed implementation of [`OrchestratorBackend`].

use super::OrchestratorBackend;
use crate::config::NetworkConfig;
use crate::error::Result;
use crate::models::{
    BackupResponse, CloneResponse, FileContent, FileNode, HealthStatus, Message, ModeRequest,
    PdfIngestRequest, PdfIngestResponse, QueryRequest, QueryResponse, RepoIngestRequest, RepoJob,
    SaveFileRequest, Session, SyncDirection, SyncRequest, SystemMode, SystemStatus, Task,
};
use crate::network::HttpClient;
use async_trait::async_trait;

/// HTTP backend bound to one orchestrator instance.
pub struct HttpBackend {
    http: HttpClient,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
        })
    }

    /// Build from `CORTEX_API_URL` or the default local address.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http: HttpClient::from_env()?,
        })
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    fn session_path(session_id: &str) -> String {
        format!("/api/v1/sessions/{}", urlencoding::encode(session_id))
    }
}

#[async_trait]
impl OrchestratorBackend for HttpBackend {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        self.http
            .post_json_with_timeout("/api/v1/query", request, NetworkConfig::QUERY_TIMEOUT)
            .await
    }

    async fn tasks(&self, session_id: Option<&str>) -> Result<Vec<Task>> {
        // The backend treats an empty session_id as "global scope"; the
        // parameter is always present.
        self.http
            .get_json(
                "/api/v1/orchestrator/tasks",
                &[("session_id", session_id.unwrap_or(""))],
            )
            .await
    }

    async fn sessions(&self) -> Result<Vec<Session>> {
        self.http.get_json("/api/v1/sessions", &[]).await
    }

    async fn session_history(&self, session_id: &str) -> Result<Vec<Message>> {
        self.http.get_json(&Self::session_path(session_id), &[]).await
    }

    async fn clone_session(&self, session_id: &str) -> Result<String> {
        let response: CloneResponse = self
            .http
            .post_empty(&format!("{}/clone", Self::session_path(session_id)))
            .await?;
        Ok(response.session_id)
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.http.delete(&Self::session_path(session_id)).await
    }

    async fn ingest_list(&self, session_id: Option<&str>) -> Result<Vec<RepoJob>> {
        self.http
            .get_json(
                "/api/v1/ingest/list",
                &[("session_id", session_id.unwrap_or(""))],
            )
            .await
    }

    async fn ingest_repo(&self, request: &RepoIngestRequest) -> Result<()> {
        self.http.post_unit("/api/v1/ingest/repo", request).await
    }

    async fn ingest_pdf(&self, request: &PdfIngestRequest) -> Result<PdfIngestResponse> {
        self.http.post_json("/api/v1/ingest/pdf", request).await
    }

    async fn repo_files(&self, repo_name: &str, path: &str) -> Result<Vec<FileNode>> {
        self.http
            .get_json(
                "/api/v1/ingest/files",
                &[("repo_name", repo_name), ("path", path)],
            )
            .await
    }

    async fn file_content(&self, repo_name: &str, path: &str) -> Result<String> {
        let body: FileContent = self
            .http
            .get_json(
                "/api/v1/ingest/content",
                &[("repo_name", repo_name), ("path", path)],
            )
            .await?;
        Ok(body.content)
    }

    async fn save_file(&self, request: &SaveFileRequest) -> Result<()> {
        self.http.post_unit("/api/v1/ingest/content", request).await
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.http.get_json("/health", &[]).await
    }

    async fn system_status(&self) -> Result<SystemStatus> {
        self.http.get_json("/api/v1/system/status", &[]).await
    }

    async fn set_system_mode(&self, mode: SystemMode) -> Result<()> {
        self.http
            .post_unit("/api/v1/system/mode", &ModeRequest { mode })
            .await
    }

    async fn trigger_sync(&self, direction: SyncDirection) -> Result<()> {
        self.http
            .post_unit("/api/v1/system/sync", &SyncRequest::merge(direction))
            .await
    }

    async fn trigger_backup(&self) -> Result<BackupResponse> {
        self.http.post_empty("/api/v1/system/backup").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_path_encodes_id() {
        assert_eq!(
            HttpBackend::session_path("s/1 x"),
            "/api/v1/sessions/s%2F1%20x"
        );
    }

    #[test]
    fn test_backend_from_default_url() {
        let backend = HttpBackend::new(NetworkConfig::DEFAULT_BASE_URL).unwrap();
        assert_eq!(
            backend.http().base_url().as_str(),
            "http://127.0.0.1:8000/"
        );
    }
}
