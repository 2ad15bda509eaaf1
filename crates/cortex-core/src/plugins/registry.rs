//! Slot registry: plugin manifests and the ordered widget lists per slot.

use super::bus::EventBus;
use super::{Plugin, PluginManifest, SlotWidget};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{error, info, warn};

/// One widget registered into a slot, attributed to its owning plugin.
#[derive(Clone)]
pub struct SlotEntry {
    pub plugin_id: String,
    pub widget: Arc<dyn SlotWidget>,
}

/// Registration-time context handed to `Plugin::init`.
///
/// Slot registrations are staged here and committed by the registry only
/// after `init` returns `Ok`, so a plugin that fails halfway contributes
/// nothing to any slot list.
pub struct PluginContext {
    plugin_id: String,
    staged: Vec<(String, SlotEntry)>,
    bus: EventBus,
}

impl PluginContext {
    /// Append a widget to the named slot. Insertion order is render order.
    pub fn register_slot(&mut self, slot_name: impl Into<String>, widget: Arc<dyn SlotWidget>) {
        self.staged.push((
            slot_name.into(),
            SlotEntry {
                plugin_id: self.plugin_id.clone(),
                widget,
            },
        ));
    }

    /// The shared event bus.
    pub fn events(&self) -> &EventBus {
        &self.bus
    }
}

#[derive(Default)]
struct RegistryState {
    /// Manifests in registration order.
    plugins: Vec<PluginManifest>,
    slots: HashMap<String, Vec<SlotEntry>>,
}

/// Mapping from slot name to the ordered widgets registered into it.
///
/// Mutated only during plugin registration at startup, read thereafter.
/// No unregister operation; entries live as long as the registry.
pub struct SlotRegistry {
    state: RwLock<RegistryState>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Register a plugin, invoking its `init` exactly once.
    ///
    /// Duplicate ids are an idempotent no-op (logged, never an error). A
    /// failing `init` is logged and leaves the registry untouched.
    pub fn register(&self, plugin: &dyn Plugin, bus: &EventBus) {
        let manifest = plugin.manifest().clone();

        {
            let state = self.state.read().expect("registry lock poisoned");
            if state.plugins.iter().any(|p| p.id == manifest.id) {
                warn!("Plugin {} already registered, ignoring", manifest.id);
                return;
            }
        }

        info!("Loading plugin: {} v{}", manifest.name, manifest.version);

        let mut context = PluginContext {
            plugin_id: manifest.id.clone(),
            staged: Vec::new(),
            bus: bus.clone(),
        };

        match plugin.init(&mut context) {
            Ok(()) => {
                let mut state = self.state.write().expect("registry lock poisoned");
                for (slot_name, entry) in context.staged {
                    state.slots.entry(slot_name).or_default().push(entry);
                }
                state.plugins.push(manifest);
            }
            Err(e) => {
                // Staged registrations are dropped with the context.
                error!("Failed to load plugin {}: {}", manifest.id, e);
            }
        }
    }

    /// Widgets registered into `slot_name`, in registration order. Unknown
    /// slots yield an empty list, never an error.
    pub fn slots(&self, slot_name: &str) -> Vec<SlotEntry> {
        self.state
            .read()
            .expect("registry lock poisoned")
            .slots
            .get(slot_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Manifests of successfully registered plugins, in registration order.
    pub fn plugins(&self) -> Vec<PluginManifest> {
        self.state
            .read()
            .expect("registry lock poisoned")
            .plugins
            .clone()
    }

    pub fn is_registered(&self, plugin_id: &str) -> bool {
        self.state
            .read()
            .expect("registry lock poisoned")
            .plugins
            .iter()
            .any(|p| p.id == plugin_id)
    }
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new()
    }
}
