//! Sticky notes with a locally persisted draft.
//!
//! The draft survives restarts via a plain text file in the data
//! directory, the way the original kept it in browser local storage.

use crate::config::PathsConfig;
use crate::error::{CortexError, Result};
use crate::plugins::{
    slots, EventBus, Plugin, PluginContext, PluginEvent, PluginManifest, SlotWidget,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

const PLUGIN_ID: &str = "cortex.notes";

struct NotesState {
    open: AtomicBool,
    draft: Mutex<String>,
    path: PathBuf,
}

struct NotesWidget {
    state: Arc<NotesState>,
}

impl SlotWidget for NotesWidget {
    fn title(&self) -> &str {
        "Notes"
    }

    fn interactive(&self) -> bool {
        true
    }

    fn on_event(&self, event: &PluginEvent) {
        if matches!(event, PluginEvent::ToggleWidget { plugin_id } if plugin_id == PLUGIN_ID) {
            self.state.open.fetch_xor(true, Ordering::SeqCst);
        }
    }

    fn render(&self, _props: &serde_json::Value) -> Result<Vec<String>> {
        if !self.state.open.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        let draft = self.state.draft.lock().expect("notes lock poisoned");
        let mut lines: Vec<String> = draft.lines().map(str::to_string).collect();
        if lines.is_empty() {
            lines.push("(empty)".to_string());
        }
        lines.push("-- saved locally --".to_string());
        Ok(lines)
    }
}

struct NotesTrigger {
    bus: EventBus,
}

impl SlotWidget for NotesTrigger {
    fn title(&self) -> &str {
        "Notes"
    }

    fn interactive(&self) -> bool {
        true
    }

    fn activate(&self) {
        self.bus.emit(PluginEvent::ToggleWidget {
            plugin_id: PLUGIN_ID.to_string(),
        });
    }

    fn render(&self, _props: &serde_json::Value) -> Result<Vec<String>> {
        Ok(vec!["Open notes".to_string()])
    }
}

/// Sticky-note plugin with a file-backed draft.
pub struct NotesPlugin {
    manifest: PluginManifest,
    state: Arc<NotesState>,
}

impl NotesPlugin {
    /// Create the plugin, loading any previously saved draft from
    /// `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        let path = data_dir.join(PathsConfig::NOTES_DRAFT_FILENAME);
        let draft = std::fs::read_to_string(&path).unwrap_or_default();
        if !draft.is_empty() {
            debug!("Restored notes draft ({} bytes)", draft.len());
        }
        Self {
            manifest: PluginManifest::new(PLUGIN_ID, "Cortex Notes", "1.0")
                .with_description("Floating sticky notes"),
            state: Arc::new(NotesState {
                open: AtomicBool::new(false),
                draft: Mutex::new(draft),
                path,
            }),
        }
    }

    pub fn draft(&self) -> String {
        self.state.draft.lock().expect("notes lock poisoned").clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        *self.state.draft.lock().expect("notes lock poisoned") = text.into();
    }

    /// Persist the draft to disk.
    pub fn save(&self) -> Result<()> {
        let draft = self.draft();
        if let Some(parent) = self.state.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CortexError::io_with_path(e, parent.to_path_buf()))?;
        }
        std::fs::write(&self.state.path, &draft)
            .map_err(|e| CortexError::io_with_path(e, self.state.path.clone()))
    }
}

impl Plugin for NotesPlugin {
    fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn init(&self, context: &mut PluginContext) -> Result<()> {
        context.register_slot(
            slots::GLOBAL_OVERLAY,
            Arc::new(NotesWidget {
                state: self.state.clone(),
            }),
        );
        context.register_slot(
            slots::SIDEBAR_ITEM,
            Arc::new(NotesTrigger {
                bus: context.events().clone(),
            }),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_draft_roundtrip_through_disk() {
        let dir = TempDir::new().unwrap();
        let notes = NotesPlugin::new(dir.path());
        notes.set_draft("remember the milk");
        notes.save().unwrap();

        let reloaded = NotesPlugin::new(dir.path());
        assert_eq!(reloaded.draft(), "remember the milk");
    }

    #[test]
    fn test_missing_draft_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let notes = NotesPlugin::new(dir.path());
        assert_eq!(notes.draft(), "");
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deeper");
        let notes = NotesPlugin::new(&nested);
        notes.set_draft("x");
        notes.save().unwrap();
        assert!(nested.join(PathsConfig::NOTES_DRAFT_FILENAME).exists());
    }
}
