//! Repository file browser: lazy, per-directory listings.
//!
//! Nothing is cached or merged; every directory click fetches that path
//! and replaces the displayed list wholesale. Switching repositories bumps
//! a generation so a slow listing for the previous repository cannot land
//! in the new one.

use crate::backend::OrchestratorBackend;
use crate::error::{CortexError, Result};
use crate::generation::Generation;
use crate::models::{FileNode, SaveFileRequest};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// A file opened in the editor modal.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenFile {
    pub name: String,
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplorerState {
    /// Bare repository name (display prefix already stripped).
    pub expanded_repo: Option<String>,
    /// Listing of the directory currently shown.
    pub files: Vec<FileNode>,
    pub open_file: Option<OpenFile>,
}

/// Browses one ingested repository at a time.
pub struct FileExplorer {
    backend: Arc<dyn OrchestratorBackend>,
    state: RwLock<ExplorerState>,
    generation: Generation,
}

impl FileExplorer {
    pub fn new(backend: Arc<dyn OrchestratorBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(ExplorerState::default()),
            generation: Generation::new(),
        }
    }

    pub fn snapshot(&self) -> ExplorerState {
        self.state.read().expect("explorer lock poisoned").clone()
    }

    pub fn expanded_repo(&self) -> Option<String> {
        self.state
            .read()
            .expect("explorer lock poisoned")
            .expanded_repo
            .clone()
    }

    /// Expand a repository (accepts the `"REPO: name"` display form) and
    /// fetch its root listing.
    pub async fn expand(&self, repo_display_name: &str) -> Result<()> {
        let name = repo_display_name
            .strip_prefix("REPO: ")
            .unwrap_or(repo_display_name)
            .to_string();
        {
            let mut state = self.state.write().expect("explorer lock poisoned");
            state.expanded_repo = Some(name.clone());
            state.files.clear();
            state.open_file = None;
        }
        self.generation.bump();
        self.fetch_listing(&name, "").await
    }

    pub fn collapse(&self) {
        let mut state = self.state.write().expect("explorer lock poisoned");
        state.expanded_repo = None;
        state.files.clear();
        state.open_file = None;
        drop(state);
        self.generation.bump();
    }

    /// Fetch the listing for `path` inside the expanded repository and
    /// replace the displayed file list with it.
    pub async fn open_dir(&self, path: &str) -> Result<()> {
        let repo = self.require_repo()?;
        self.fetch_listing(&repo, path).await
    }

    /// Fetch a file's content into the editor.
    pub async fn open_file(&self, path: &str) -> Result<()> {
        let repo = self.require_repo()?;
        let guard = self.generation.guard();
        let content = self.backend.file_content(&repo, path).await?;
        guard.check()?;

        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        self.state.write().expect("explorer lock poisoned").open_file = Some(OpenFile {
            name,
            path: path.to_string(),
            content,
        });
        Ok(())
    }

    /// Write the editor buffer back to the repository.
    pub async fn save_open_file(&self, content: &str) -> Result<()> {
        let repo = self.require_repo()?;
        let path = self
            .snapshot()
            .open_file
            .map(|f| f.path)
            .ok_or_else(|| CortexError::Other("no file open".to_string()))?;

        let request = SaveFileRequest {
            repo_name: repo,
            path,
            content: content.to_string(),
        };
        self.backend.save_file(&request).await?;

        let mut state = self.state.write().expect("explorer lock poisoned");
        if let Some(open) = state.open_file.as_mut() {
            open.content = content.to_string();
        }
        Ok(())
    }

    async fn fetch_listing(&self, repo: &str, path: &str) -> Result<()> {
        let guard = self.generation.guard();
        let files = self.backend.repo_files(repo, path).await?;
        if let Err(stale) = guard.check() {
            debug!("Discarding stale listing for {}:{}", repo, path);
            return Err(stale.into());
        }
        self.state.write().expect("explorer lock poisoned").files = files;
        Ok(())
    }

    fn require_repo(&self) -> Result<String> {
        self.expanded_repo()
            .ok_or_else(|| CortexError::Other("no repository expanded".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullBackend;

    #[tokio::test]
    async fn test_expand_strips_display_prefix() {
        let explorer = FileExplorer::new(Arc::new(NullBackend::new()));
        explorer.expand("REPO: genesis").await.unwrap();
        assert_eq!(explorer.expanded_repo().as_deref(), Some("genesis"));
    }

    #[tokio::test]
    async fn test_open_dir_without_repo_fails() {
        let explorer = FileExplorer::new(Arc::new(NullBackend::new()));
        assert!(explorer.open_dir("src").await.is_err());
    }

    #[tokio::test]
    async fn test_collapse_clears_state() {
        let explorer = FileExplorer::new(Arc::new(NullBackend::new()));
        explorer.expand("genesis").await.unwrap();
        explorer.collapse();
        let state = explorer.snapshot();
        assert!(state.expanded_repo.is_none());
        assert!(state.files.is_empty());
    }
}
