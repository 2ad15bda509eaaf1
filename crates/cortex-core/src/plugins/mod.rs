//! Plugin slot system.
//!
//! Independently authored widgets register themselves into named extension
//! points ("slots") at startup; the shell renders a slot without knowing
//! what was registered into it. The registry is an explicitly constructed
//! value handed to whoever needs it, never a process-global, so tests can
//! build as many independent registries as they like.

pub mod builtin;
mod bus;
mod host;
mod registry;

pub use bus::{EventBus, PluginEvent};
pub use host::{PluginHost, RenderedWidget};
pub use registry::{PluginContext, SlotEntry, SlotRegistry};

use crate::error::Result;

/// Well-known slot names.
pub mod slots {
    /// Fixed layer above all other content. The layer itself is
    /// input-transparent; widgets opt back in individually.
    pub const GLOBAL_OVERLAY: &str = "global-overlay";
    /// One row per widget in the sidebar's tools section.
    pub const SIDEBAR_ITEM: &str = "sidebar-item";
}

/// Identity and display metadata for a plugin. Identity key is `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
}

impl PluginManifest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A self-contained unit of UI functionality.
///
/// `init` runs exactly once, synchronously, at registration time. Slot
/// registrations made through the context are committed only if `init`
/// returns `Ok`; a failing plugin contributes nothing.
pub trait Plugin: Send + Sync {
    fn manifest(&self) -> &PluginManifest;
    fn init(&self, context: &mut PluginContext) -> Result<()>;
}

/// A widget registered into a slot.
///
/// Rendering is headless: a widget produces text lines for the shell to
/// draw. An empty render means the widget is currently hidden (closed
/// overlay panels render nothing). `interactive` is the opt-in by which an
/// overlay widget re-enables input handling for itself; the overlay layer
/// as a whole never captures input.
pub trait SlotWidget: Send + Sync {
    fn title(&self) -> &str;

    fn interactive(&self) -> bool {
        false
    }

    /// Typed cross-widget signaling, delivered synchronously by the host.
    fn on_event(&self, _event: &PluginEvent) {}

    /// Invoked when the shell activates an interactive widget (the
    /// headless analog of a click). Triggers emit their toggle event here.
    fn activate(&self) {}

    fn render(&self, props: &serde_json::Value) -> Result<Vec<String>>;
}
