//! Plugin host: slot rendering, the overlay layer, and event dispatch.

use super::bus::{EventBus, PluginEvent};
use super::registry::SlotRegistry;
use super::{slots, Plugin};
use std::sync::Arc;
use tracing::warn;

/// The output of one widget rendered into a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedWidget {
    pub plugin_id: String,
    pub title: String,
    pub lines: Vec<String>,
    /// Overlay widgets opt back into input handling with this; the overlay
    /// layer itself never captures input.
    pub interactive: bool,
}

/// Wraps the registry and bus; the shell's single entry point into the
/// plugin system.
pub struct PluginHost {
    registry: Arc<SlotRegistry>,
    bus: EventBus,
}

impl PluginHost {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(SlotRegistry::new()),
            bus: EventBus::new(),
        }
    }

    /// Build a host around an existing registry (tests construct registries
    /// directly).
    pub fn with_registry(registry: Arc<SlotRegistry>) -> Self {
        Self {
            registry,
            bus: EventBus::new(),
        }
    }

    pub fn register(&self, plugin: &dyn Plugin) {
        self.registry.register(plugin, &self.bus);
    }

    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Deliver an event to every registered widget without re-broadcasting
    /// it. Used when draining events that already came off the bus.
    pub fn deliver(&self, event: &PluginEvent) {
        for slot_name in [slots::GLOBAL_OVERLAY, slots::SIDEBAR_ITEM] {
            for entry in self.registry.slots(slot_name) {
                entry.widget.on_event(event);
            }
        }
    }

    /// Deliver an event to every registered widget, then broadcast it to
    /// external subscribers.
    pub fn dispatch(&self, event: PluginEvent) {
        self.deliver(&event);
        self.bus.emit(event);
    }

    /// Render every widget registered into `slot_name`, in registration
    /// order, passing the same props to each.
    ///
    /// Failures are isolated per widget: a widget whose render fails is
    /// logged and skipped, never blanking the rest of the slot. Widgets
    /// that render no lines are hidden and omitted.
    pub fn render_slot(&self, slot_name: &str, props: &serde_json::Value) -> Vec<RenderedWidget> {
        self.registry
            .slots(slot_name)
            .into_iter()
            .filter_map(|entry| match entry.widget.render(props) {
                Ok(lines) if lines.is_empty() => None,
                Ok(lines) => Some(RenderedWidget {
                    plugin_id: entry.plugin_id,
                    title: entry.widget.title().to_string(),
                    lines,
                    interactive: entry.widget.interactive(),
                }),
                Err(e) => {
                    warn!(
                        "Widget {} failed to render slot {}: {}",
                        entry.plugin_id, slot_name, e
                    );
                    None
                }
            })
            .collect()
    }

    /// Render the fixed overlay layer.
    pub fn render_overlay(&self) -> Vec<RenderedWidget> {
        self.render_slot(slots::GLOBAL_OVERLAY, &serde_json::Value::Null)
    }
}

impl Default for PluginHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CortexError, Result};
    use crate::plugins::{PluginContext, PluginManifest, SlotWidget};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Steady(&'static str);

    impl SlotWidget for Steady {
        fn title(&self) -> &str {
            self.0
        }

        fn render(&self, props: &serde_json::Value) -> Result<Vec<String>> {
            let suffix = props.as_str().unwrap_or("");
            Ok(vec![format!("{}{}", self.0, suffix)])
        }
    }

    struct Broken;

    impl SlotWidget for Broken {
        fn title(&self) -> &str {
            "broken"
        }

        fn render(&self, _props: &serde_json::Value) -> Result<Vec<String>> {
            Err(CortexError::Other("render exploded".into()))
        }
    }

    struct Toggleable {
        open: AtomicBool,
    }

    impl SlotWidget for Toggleable {
        fn title(&self) -> &str {
            "toggleable"
        }

        fn interactive(&self) -> bool {
            true
        }

        fn on_event(&self, event: &PluginEvent) {
            if matches!(event, PluginEvent::ToggleWidget { plugin_id } if plugin_id == "p1") {
                self.open.fetch_xor(true, Ordering::SeqCst);
            }
        }

        fn render(&self, _props: &serde_json::Value) -> Result<Vec<String>> {
            if self.open.load(Ordering::SeqCst) {
                Ok(vec!["panel".into()])
            } else {
                Ok(Vec::new())
            }
        }
    }

    struct HostPlugin {
        manifest: PluginManifest,
        widgets: Vec<Arc<dyn SlotWidget>>,
    }

    impl Plugin for HostPlugin {
        fn manifest(&self) -> &PluginManifest {
            &self.manifest
        }

        fn init(&self, context: &mut PluginContext) -> Result<()> {
            for widget in &self.widgets {
                context.register_slot(slots::GLOBAL_OVERLAY, widget.clone());
            }
            Ok(())
        }
    }

    #[test]
    fn test_render_passes_props_uniformly() {
        let host = PluginHost::new();
        host.register(&HostPlugin {
            manifest: PluginManifest::new("p1", "P1", "1.0"),
            widgets: vec![Arc::new(Steady("a")), Arc::new(Steady("b"))],
        });

        let rendered = host.render_slot(slots::GLOBAL_OVERLAY, &serde_json::json!("!"));
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].lines, vec!["a!"]);
        assert_eq!(rendered[1].lines, vec!["b!"]);
    }

    #[test]
    fn test_render_failure_is_isolated() {
        let host = PluginHost::new();
        host.register(&HostPlugin {
            manifest: PluginManifest::new("p1", "P1", "1.0"),
            widgets: vec![Arc::new(Steady("a")), Arc::new(Broken), Arc::new(Steady("c"))],
        });

        let rendered = host.render_overlay();
        // The broken widget is skipped; the others survive.
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].lines, vec!["a"]);
        assert_eq!(rendered[1].lines, vec!["c"]);
    }

    #[test]
    fn test_hidden_widgets_are_omitted_until_toggled() {
        let host = PluginHost::new();
        host.register(&HostPlugin {
            manifest: PluginManifest::new("p1", "P1", "1.0"),
            widgets: vec![Arc::new(Toggleable {
                open: AtomicBool::new(false),
            })],
        });

        assert!(host.render_overlay().is_empty());

        host.dispatch(PluginEvent::ToggleWidget {
            plugin_id: "p1".into(),
        });
        let rendered = host.render_overlay();
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].interactive);
    }
}
