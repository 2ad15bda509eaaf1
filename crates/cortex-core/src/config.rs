//! Centralized configuration for the Cortex client core.
//!
//! Constants for network timeouts, the session poll cadence, viewer zoom
//! bounds, and on-disk file names.

use std::time::Duration;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    /// Default orchestrator base URL when `CORTEX_API_URL` is unset.
    pub const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:8000";
    /// Environment variable overriding the base URL.
    pub const BASE_URL_ENV: &'static str = "CORTEX_API_URL";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    /// Query answers wait on a remote LLM and can be slow.
    pub const QUERY_TIMEOUT: Duration = Duration::from_secs(180);
    pub const USER_AGENT: &'static str = "cortex-console/0.3";
}

/// Session synchronization configuration.
pub struct SyncConfig;

impl SyncConfig {
    /// Fixed cadence at which tasks and repositories are re-fetched for the
    /// current session while a view is mounted.
    pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
    /// Below this terminal width the session panel auto-collapses when a
    /// session is selected.
    pub const COMPACT_VIEWPORT_COLS: u32 = 100;
    pub const DEFAULT_MODEL: &'static str = "Meta-Llama-3.3-70B-Instruct";
    pub const DEFAULT_PROVIDER: &'static str = "sambanova";
}

/// Document viewer bounds.
pub struct ViewerConfig;

impl ViewerConfig {
    pub const MIN_ZOOM: f32 = 0.5;
    pub const MAX_ZOOM: f32 = 2.5;
    pub const ZOOM_STEP: f32 = 0.1;
    pub const DEFAULT_ZOOM: f32 = 1.0;
}

/// On-disk names for the little local state the client keeps.
pub struct PathsConfig;

impl PathsConfig {
    pub const DATA_DIR_NAME: &'static str = "cortex";
    pub const NOTES_DRAFT_FILENAME: &'static str = "notes-draft.txt";
}
