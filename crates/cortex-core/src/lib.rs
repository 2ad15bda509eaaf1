//! Cortex Core - Headless client library for an orchestrator/RAG backend.
//!
//! This crate owns the client-side state machines of the Cortex console:
//! session synchronization against a backend whose session id can change
//! at any moment, a plugin slot registry for independently authored
//! widgets, a fetch-to-local-blob document loader, and a typed surface
//! over every HTTP endpoint the backend exposes. It has no terminal or
//! rendering dependencies; the `cortex-console` binary is one front end
//! over it.
//!
//! # Example
//!
//! ```rust,ignore
//! use cortex_core::backend::HttpBackend;
//! use cortex_core::session::SessionSyncController;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> cortex_core::Result<()> {
//!     let backend = Arc::new(HttpBackend::from_env()?);
//!     let sessions = Arc::new(SessionSyncController::new(backend));
//!     sessions.start_polling();
//!     sessions.send_message("Summarize the ingested repo").await;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod explorer;
pub mod generation;
pub mod models;
pub mod network;
pub mod plugins;
pub mod session;

// Re-export commonly used types
pub use backend::{HttpBackend, NullBackend, OrchestratorBackend};
pub use document::{BlobStore, DocumentState, FitMode, PdfBlobLoader, ViewerState};
pub use error::{CortexError, Result};
pub use explorer::{ExplorerState, FileExplorer};
pub use generation::{Generation, GenerationGuard};
pub use models::{
    FileNode, IngestScope, Message, QueryRequest, QueryResponse, RepoJob, Role, Session,
    SystemMode, Task, TaskStatus,
};
pub use network::{ConnectivityState, HttpClient};
pub use plugins::{EventBus, Plugin, PluginEvent, PluginHost, PluginManifest, SlotRegistry};
pub use session::{QuerySettings, SessionSyncController, ViewState};
