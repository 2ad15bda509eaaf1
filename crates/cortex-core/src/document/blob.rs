//! Locally owned, revocable handles over fetched document bytes.
//!
//! The browser original wrapped fetched PDFs in object URLs and had to
//! remember to revoke them; a forgotten revoke leaked the blob for the
//! page's lifetime. Here revocation is tied to ownership: dropping the
//! handle revokes it, and the store counts live handles so tests can
//! assert nothing leaked.

use bytes::Bytes;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Issues and tracks [`BlobHandle`]s.
#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    live: Arc<Mutex<HashSet<String>>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap bytes in a new locally addressable handle.
    pub fn insert(&self, data: Bytes) -> BlobHandle {
        let id = format!("blob:{}", uuid::Uuid::new_v4());
        self.live
            .lock()
            .expect("blob store lock poisoned")
            .insert(id.clone());
        debug!("Created {} ({} bytes)", id, data.len());
        BlobHandle {
            id,
            data,
            live: self.live.clone(),
        }
    }

    /// Number of handles that have been issued and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.live.lock().expect("blob store lock poisoned").len()
    }

    /// Whether the given blob URL is still alive.
    pub fn is_live(&self, url: &str) -> bool {
        self.live
            .lock()
            .expect("blob store lock poisoned")
            .contains(url)
    }
}

/// Exclusive ownership of one blob. Not clonable: the handle must never be
/// aliased across loader instances. Dropping it revokes the blob.
#[derive(Debug)]
pub struct BlobHandle {
    id: String,
    data: Bytes,
    live: Arc<Mutex<HashSet<String>>>,
}

impl BlobHandle {
    /// The local address standing in for the remote URL.
    pub fn url(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Drop for BlobHandle {
    fn drop(&mut self) {
        self.live
            .lock()
            .expect("blob store lock poisoned")
            .remove(&self.id);
        debug!("Revoked {}", self.id);
    }
}
