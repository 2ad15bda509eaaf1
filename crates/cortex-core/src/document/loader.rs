//! Fetches a remote PDF into memory and hands the renderer a locally
//! owned blob instead of the remote URL.
//!
//! The rendering library's direct-URL mode cannot cross origins, so the
//! document is fetched once and re-addressed locally. Network failure and
//! parse failure are distinct states: the first offers the original URL as
//! an open-externally fallback, the second means the bytes arrived but are
//! not a PDF.

use crate::document::blob::{BlobHandle, BlobStore};
use crate::error::{CortexError, Result};
use crate::generation::Generation;
use crate::network::HttpClient;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Fetches raw document bytes. The document may live on a different host
/// than the orchestrator API.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

#[async_trait]
impl DocumentFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        self.get_bytes_absolute(url).await
    }
}

/// Where the loader currently stands.
#[derive(Debug)]
pub enum DocumentState {
    /// No document selected.
    Empty,
    Loading {
        url: String,
    },
    Ready {
        url: String,
        handle: BlobHandle,
    },
    /// Could not download; `url` doubles as the open-externally fallback.
    FetchError {
        url: String,
        message: String,
    },
    /// Downloaded fine, but the payload is not a readable PDF.
    ParseError {
        url: String,
        message: String,
    },
}

impl DocumentState {
    pub fn is_ready(&self) -> bool {
        matches!(self, DocumentState::Ready { .. })
    }

    /// The local blob address to hand the renderer, when ready.
    pub fn blob_url(&self) -> Option<String> {
        match self {
            DocumentState::Ready { handle, .. } => Some(handle.url().to_string()),
            _ => None,
        }
    }

    /// The remote URL this state refers to, if any.
    pub fn source_url(&self) -> Option<&str> {
        match self {
            DocumentState::Empty => None,
            DocumentState::Loading { url }
            | DocumentState::Ready { url, .. }
            | DocumentState::FetchError { url, .. }
            | DocumentState::ParseError { url, .. } => Some(url),
        }
    }
}

/// Owns at most one live blob at a time; superseding the document or
/// dropping the loader releases it.
pub struct PdfBlobLoader {
    fetcher: Arc<dyn DocumentFetcher>,
    store: BlobStore,
    generation: Generation,
    state: Mutex<DocumentState>,
}

impl PdfBlobLoader {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self::with_store(fetcher, BlobStore::new())
    }

    /// Use a shared store so callers can observe handle liveness.
    pub fn with_store(fetcher: Arc<dyn DocumentFetcher>, store: BlobStore) -> Self {
        Self {
            fetcher,
            store,
            generation: Generation::new(),
            state: Mutex::new(DocumentState::Empty),
        }
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// Inspect the current state.
    pub fn with_state<T>(&self, f: impl FnOnce(&DocumentState) -> T) -> T {
        f(&self.state.lock().expect("loader lock poisoned"))
    }

    pub fn is_ready(&self) -> bool {
        self.with_state(DocumentState::is_ready)
    }

    pub fn blob_url(&self) -> Option<String> {
        self.with_state(DocumentState::blob_url)
    }

    /// Load a new document URL (`None` clears the viewer).
    ///
    /// Superseding an in-flight load is not a cancellation: the old fetch
    /// keeps running, but its result is recognized as stale when it
    /// resolves and dropped without ever creating a handle. Returns
    /// `Err(Stale)` in that case so callers know nothing was applied.
    pub async fn load(&self, url: Option<&str>) -> Result<()> {
        self.generation.bump();
        let guard = self.generation.guard();

        let Some(url) = url else {
            *self.state.lock().expect("loader lock poisoned") = DocumentState::Empty;
            return Ok(());
        };

        {
            // Entering Loading drops any previous handle, so the old blob
            // is released as soon as it is superseded.
            *self.state.lock().expect("loader lock poisoned") = DocumentState::Loading {
                url: url.to_string(),
            };
        }

        let fetched = self.fetcher.fetch(url).await;

        // A newer load (or a clear) happened while we were fetching; the
        // bytes never become a handle, so nothing leaks.
        if let Err(stale) = guard.check() {
            debug!("Discarding stale document fetch for {}", url);
            return Err(stale.into());
        }

        let next = match fetched {
            Err(e) => DocumentState::FetchError {
                url: url.to_string(),
                message: e.to_string(),
            },
            Ok(bytes) => match validate_pdf(&bytes) {
                Err(e) => DocumentState::ParseError {
                    url: url.to_string(),
                    message: e.to_string(),
                },
                Ok(()) => DocumentState::Ready {
                    url: url.to_string(),
                    handle: self.store.insert(bytes),
                },
            },
        };

        *self.state.lock().expect("loader lock poisoned") = next;
        Ok(())
    }
}

/// The minimal structural check that stands in for the delegated
/// rendering library's parse step.
fn validate_pdf(bytes: &Bytes) -> Result<()> {
    if bytes.is_empty() {
        return Err(CortexError::DocumentParse {
            message: "empty document".to_string(),
        });
    }
    // Some generators emit a UTF-8 BOM or whitespace before the header.
    let body: &[u8] = bytes.as_ref();
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace() && *b != 0xEF && *b != 0xBB && *b != 0xBF)
        .unwrap_or(0);
    if !body[start..].starts_with(b"%PDF-") {
        return Err(CortexError::DocumentParse {
            message: "missing %PDF header".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Notify;

    /// Scripted fetcher: each URL maps to bytes or an error, optionally
    /// blocking until released so tests can interleave loads.
    #[derive(Default)]
    struct ScriptedFetcher {
        responses: HashMap<String, std::result::Result<Bytes, String>>,
        gate: Option<Gate>,
    }

    struct Gate {
        url: String,
        /// Signalled when the gated fetch has started.
        started: Arc<Notify>,
        /// The gated fetch waits here until the test releases it.
        release: Arc<Notify>,
    }

    impl ScriptedFetcher {
        fn ok(mut self, url: &str, body: &'static [u8]) -> Self {
            self.responses
                .insert(url.to_string(), Ok(Bytes::from_static(body)));
            self
        }

        fn fail(mut self, url: &str, message: &str) -> Self {
            self.responses
                .insert(url.to_string(), Err(message.to_string()));
            self
        }

        fn gated(mut self, url: &str, started: Arc<Notify>, release: Arc<Notify>) -> Self {
            self.gate = Some(Gate {
                url: url.to_string(),
                started,
                release,
            });
            self
        }
    }

    #[async_trait]
    impl DocumentFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<Bytes> {
            if let Some(gate) = &self.gate {
                if gate.url == url {
                    gate.started.notify_one();
                    gate.release.notified().await;
                }
            }
            match self.responses.get(url) {
                Some(Ok(bytes)) => Ok(bytes.clone()),
                Some(Err(message)) => Err(CortexError::DocumentFetch {
                    url: url.to_string(),
                    message: message.clone(),
                }),
                None => Err(CortexError::DocumentFetch {
                    url: url.to_string(),
                    message: "HTTP 404".to_string(),
                }),
            }
        }
    }

    const PDF: &[u8] = b"%PDF-1.7 minimal";

    #[tokio::test]
    async fn test_successful_load_creates_one_handle() {
        let fetcher = Arc::new(ScriptedFetcher::default().ok("http://x/a.pdf", PDF));
        let loader = PdfBlobLoader::new(fetcher);

        loader.load(Some("http://x/a.pdf")).await.unwrap();
        assert!(loader.is_ready());
        assert_eq!(loader.store().live_count(), 1);
        assert!(loader.blob_url().unwrap().starts_with("blob:"));
    }

    #[tokio::test]
    async fn test_superseding_releases_previous_handle() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .ok("http://x/a.pdf", PDF)
                .ok("http://x/b.pdf", PDF),
        );
        let loader = PdfBlobLoader::new(fetcher);

        loader.load(Some("http://x/a.pdf")).await.unwrap();
        let first_url = loader.blob_url().unwrap();
        loader.load(Some("http://x/b.pdf")).await.unwrap();

        assert_eq!(loader.store().live_count(), 1);
        assert!(!loader.store().is_live(&first_url));
    }

    #[tokio::test]
    async fn test_slow_old_fetch_cannot_clobber_newer_selection() {
        let started_p1 = Arc::new(Notify::new());
        let release_p1 = Arc::new(Notify::new());
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .ok("http://x/p1.pdf", PDF)
                .ok("http://x/p2.pdf", PDF)
                .gated("http://x/p1.pdf", started_p1.clone(), release_p1.clone()),
        );
        let loader = Arc::new(PdfBlobLoader::new(fetcher));

        let slow = {
            let loader = loader.clone();
            tokio::spawn(async move { loader.load(Some("http://x/p1.pdf")).await })
        };
        started_p1.notified().await;

        // P2 supersedes P1 while P1 is still fetching.
        loader.load(Some("http://x/p2.pdf")).await.unwrap();
        release_p1.notify_one();

        let stale = slow.await.unwrap();
        assert!(stale.unwrap_err().is_stale());

        // Only P2 is displayed, and only one handle is alive.
        assert_eq!(
            loader.with_state(|s| s.source_url().map(str::to_string)),
            Some("http://x/p2.pdf".to_string())
        );
        assert_eq!(loader.store().live_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_keeps_original_url_as_fallback() {
        let fetcher =
            Arc::new(ScriptedFetcher::default().fail("http://x/gone.pdf", "HTTP 404"));
        let loader = PdfBlobLoader::new(fetcher);

        loader.load(Some("http://x/gone.pdf")).await.unwrap();
        loader.with_state(|state| match state {
            DocumentState::FetchError { url, message } => {
                assert_eq!(url, "http://x/gone.pdf");
                assert!(message.contains("404"));
            }
            other => panic!("expected FetchError, got {:?}", other),
        });
        assert_eq!(loader.store().live_count(), 0);
    }

    #[tokio::test]
    async fn test_non_pdf_payload_is_a_parse_error() {
        let fetcher =
            Arc::new(ScriptedFetcher::default().ok("http://x/fake.pdf", b"<html>nope</html>"));
        let loader = PdfBlobLoader::new(fetcher);

        loader.load(Some("http://x/fake.pdf")).await.unwrap();
        loader.with_state(|state| {
            assert!(matches!(state, DocumentState::ParseError { .. }));
        });
        assert_eq!(loader.store().live_count(), 0);
    }

    #[tokio::test]
    async fn test_clearing_releases_the_handle() {
        let fetcher = Arc::new(ScriptedFetcher::default().ok("http://x/a.pdf", PDF));
        let loader = PdfBlobLoader::new(fetcher);

        loader.load(Some("http://x/a.pdf")).await.unwrap();
        assert_eq!(loader.store().live_count(), 1);

        loader.load(None).await.unwrap();
        assert_eq!(loader.store().live_count(), 0);
        loader.with_state(|state| assert!(matches!(state, DocumentState::Empty)));
    }

    #[test]
    fn test_validate_pdf_accepts_leading_noise() {
        assert!(validate_pdf(&Bytes::from_static(b"%PDF-1.4")).is_ok());
        assert!(validate_pdf(&Bytes::from_static(b"\xEF\xBB\xBF%PDF-1.4")).is_ok());
        assert!(validate_pdf(&Bytes::from_static(b"  %PDF-1.4")).is_ok());
        assert!(validate_pdf(&Bytes::from_static(b"")).is_err());
        assert!(validate_pdf(&Bytes::from_static(b"PDF-1.4")).is_err());
    }
}
