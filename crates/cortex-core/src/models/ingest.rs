//! Ingestion models: repository jobs and the lazily fetched file tree.

use serde::{Deserialize, Serialize};

/// Visibility of an ingested resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IngestScope {
    #[default]
    Global,
    Session,
}

/// An ingestion job as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepoJob {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RepoJob {
    /// Repository jobs are listed with a `"REPO: "` display prefix; the
    /// files and content endpoints want the bare name.
    pub fn clean_name(&self) -> &str {
        self.name.strip_prefix("REPO: ").unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Dir,
}

/// One entry of a repository directory listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }
}

/// Body of `POST /api/v1/ingest/repo`.
#[derive(Debug, Clone, Serialize)]
pub struct RepoIngestRequest {
    pub url: String,
    pub scope: IngestScope,
    pub session_id: Option<String>,
}

/// Body of `POST /api/v1/ingest/pdf`.
#[derive(Debug, Clone, Serialize)]
pub struct PdfIngestRequest {
    pub url: String,
    pub scope: IngestScope,
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rag_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_offset: Option<i32>,
    pub enable_ocr: bool,
}

/// Response of `POST /api/v1/ingest/pdf`.
#[derive(Debug, Clone, Deserialize)]
pub struct PdfIngestResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    /// Where the backend stored the document; feeds the PDF viewer.
    #[serde(default)]
    pub file_url: Option<String>,
}

/// Response of `GET /api/v1/ingest/content`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileContent {
    pub content: String,
}

/// Body of `POST /api/v1/ingest/content`.
#[derive(Debug, Clone, Serialize)]
pub struct SaveFileRequest {
    pub repo_name: String,
    pub path: String,
    pub content: String,
}
