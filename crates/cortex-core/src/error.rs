//! Error types for the Cortex client core.
//!
//! Distinguishes connectivity failures (which background polls swallow and
//! explicit user actions surface inline) from backend-reported errors and
//! from document parse failures, which each get their own display channel.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the Cortex client core.
#[derive(Debug, Error)]
pub enum CortexError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// Non-2xx response with a normalized `detail` payload.
    #[error("Backend error (HTTP {status}): {detail}")]
    Backend { status: u16, detail: String },

    /// Returned by the null backend for every mutating operation.
    #[error("No backend configured")]
    BackendUnavailable,

    // Session errors
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    // Document errors: fetch and parse are distinct channels so the
    // user-facing message can distinguish "couldn't download" from
    // "couldn't parse". Fetch errors keep the original URL so the caller
    // can offer to open it externally.
    #[error("Document download failed for {url}: {message}")]
    DocumentFetch { url: String, message: String },

    #[error("Document is not a readable PDF: {message}")]
    DocumentParse { message: String },

    /// A response resolved after its target (session, document URL) was
    /// superseded. Never shown to the user; callers drop it.
    #[error("Stale response discarded (generation {observed}, current {current})")]
    Stale { observed: u64, current: u64 },

    // Plugin errors
    #[error("Plugin {plugin_id} failed: {message}")]
    Plugin { plugin_id: String, message: String },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // File system errors (notes drafts, config)
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Cortex operations.
pub type Result<T> = std::result::Result<T, CortexError>;

// Conversion implementations for common error types

impl From<std::io::Error> for CortexError {
    fn from(err: std::io::Error) -> Self {
        CortexError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for CortexError {
    fn from(err: serde_json::Error) -> Self {
        CortexError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for CortexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CortexError::Timeout(Duration::from_secs(0))
        } else {
            CortexError::Network {
                message: err.to_string(),
                source: Some(err),
            }
        }
    }
}

impl From<url::ParseError> for CortexError {
    fn from(err: url::ParseError) -> Self {
        CortexError::InvalidUrl(err.to_string())
    }
}

impl CortexError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        CortexError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether this error indicates a connectivity problem (as opposed to a
    /// backend-reported failure). Connectivity errors flip the offline
    /// indicator; background polls log them and otherwise stay silent.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            CortexError::Network { .. } | CortexError::Timeout(_)
        )
    }

    /// Whether a stale-generation guard produced this error.
    pub fn is_stale(&self) -> bool {
        matches!(self, CortexError::Stale { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CortexError::SessionNotFound {
            session_id: "s-42".into(),
        };
        assert_eq!(err.to_string(), "Session not found: s-42");
    }

    #[test]
    fn test_connectivity_classification() {
        assert!(CortexError::Timeout(Duration::from_secs(5)).is_connectivity());
        assert!(CortexError::Network {
            message: "refused".into(),
            source: None
        }
        .is_connectivity());
        assert!(!CortexError::Backend {
            status: 500,
            detail: "boom".into()
        }
        .is_connectivity());
    }

    #[test]
    fn test_document_channels_are_distinct() {
        let fetch = CortexError::DocumentFetch {
            url: "http://x/doc.pdf".into(),
            message: "HTTP 404".into(),
        };
        let parse = CortexError::DocumentParse {
            message: "missing header".into(),
        };
        assert!(fetch.to_string().contains("download failed"));
        assert!(parse.to_string().contains("not a readable PDF"));
    }
}
