//! Drive picker backed by a pluggable listing source.
//!
//! Without credentials there is no real drive integration; the
//! credential-less case is an explicit [`NullDriveSource`] and the demo
//! listing an explicit [`MockDriveSource`], never a silently substituted
//! stub.

use crate::error::Result;
use crate::plugins::{
    slots, EventBus, Plugin, PluginContext, PluginEvent, PluginManifest, SlotWidget,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const PLUGIN_ID: &str = "cortex.drive";

/// One row of the picker listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveEntry {
    pub name: String,
    /// Coarse type label ("folder", "document", "image").
    pub kind: &'static str,
}

/// Where the picker gets its listing from.
pub trait DriveSource: Send + Sync {
    fn list(&self) -> Vec<DriveEntry>;
}

/// No credentials, no listing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDriveSource;

impl DriveSource for NullDriveSource {
    fn list(&self) -> Vec<DriveEntry> {
        Vec::new()
    }
}

/// Canned demo listing shown when the picker runs without a real account.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockDriveSource;

impl DriveSource for MockDriveSource {
    fn list(&self) -> Vec<DriveEntry> {
        vec![
            DriveEntry {
                name: "Project Plans".into(),
                kind: "folder",
            },
            DriveEntry {
                name: "Q3 Report.pdf".into(),
                kind: "document",
            },
            DriveEntry {
                name: "Architecture.png".into(),
                kind: "image",
            },
        ]
    }
}

struct DriveWidget {
    open: Arc<AtomicBool>,
    source: Arc<dyn DriveSource>,
}

impl SlotWidget for DriveWidget {
    fn title(&self) -> &str {
        "Drive"
    }

    fn interactive(&self) -> bool {
        true
    }

    fn on_event(&self, event: &PluginEvent) {
        if matches!(event, PluginEvent::ToggleWidget { plugin_id } if plugin_id == PLUGIN_ID) {
            self.open.fetch_xor(true, Ordering::SeqCst);
        }
    }

    fn render(&self, _props: &serde_json::Value) -> Result<Vec<String>> {
        if !self.open.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        let entries = self.source.list();
        if entries.is_empty() {
            return Ok(vec!["Drive is not connected".to_string()]);
        }
        Ok(entries
            .into_iter()
            .map(|entry| format!("[{}] {}", entry.kind, entry.name))
            .collect())
    }
}

struct DriveTrigger {
    bus: EventBus,
}

impl SlotWidget for DriveTrigger {
    fn title(&self) -> &str {
        "Drive"
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
        Ok(vec!["Open drive".to_string()])
    }
}

/// Drive picker plugin.
pub struct DrivePickerPlugin {
    manifest: PluginManifest,
    open: Arc<AtomicBool>,
    source: Arc<dyn DriveSource>,
}

impl DrivePickerPlugin {
    pub fn new(source: Arc<dyn DriveSource>) -> Self {
        Self {
            manifest: PluginManifest::new(PLUGIN_ID, "Drive Picker", "1.0")
                .with_description("Drive file picker"),
            open: Arc::new(AtomicBool::new(false)),
            source,
        }
    }
}

impl Plugin for DrivePickerPlugin {
    fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn init(&self, context: &mut PluginContext) -> Result<()> {
        context.register_slot(
            slots::GLOBAL_OVERLAY,
            Arc::new(DriveWidget {
                open: self.open.clone(),
                source: self.source.clone(),
            }),
        );
        context.register_slot(
            slots::SIDEBAR_ITEM,
            Arc::new(DriveTrigger {
                bus: context.events().clone(),
            }),
        );
        Ok(())
    }
}
