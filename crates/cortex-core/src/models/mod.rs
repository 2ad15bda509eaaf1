//! Wire models for the orchestrator HTTP API.
//!
//! Field names follow the backend's snake_case JSON. Deserialization is
//! tolerant where the backend is known to be loose (timestamps without
//! timezones, `sources` as either objects or a JSON-encoded string).

mod ingest;
mod query;
mod session;
mod system;
mod task;

pub use ingest::{
    FileContent, FileKind, FileNode, IngestScope, PdfIngestRequest, PdfIngestResponse,
    RepoIngestRequest, RepoJob, SaveFileRequest,
};
pub use query::{QueryMode, QueryRequest, QueryResponse, ResponseMetadata, SourceRef};
pub use session::{CloneResponse, Message, Role, Session};
pub use system::{
    BackupResponse, HealthStatus, ModeRequest, SyncDirection, SyncRequest, SystemMode,
    SystemStatus,
};
pub use task::{Task, TaskStatus};
