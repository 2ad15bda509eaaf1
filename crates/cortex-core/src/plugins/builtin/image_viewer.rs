//! Overlay image viewer: an ordered list of URLs and a cursor.

use crate::error::Result;
use crate::plugins::{
    slots, EventBus, Plugin, PluginContext, PluginEvent, PluginManifest, SlotWidget,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

const PLUGIN_ID: &str = "cortex.image-viewer";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg"];

fn looks_like_image(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('.')
        .next()
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[derive(Default)]
struct GalleryState {
    urls: Vec<String>,
    index: usize,
}

struct ViewerState {
    open: AtomicBool,
    gallery: Mutex<GalleryState>,
}

struct ImageViewerWidget {
    state: Arc<ViewerState>,
}

impl SlotWidget for ImageViewerWidget {
    fn title(&self) -> &str {
        "Image Viewer"
    }

    fn interactive(&self) -> bool {
        true
    }

    fn on_event(&self, event: &PluginEvent) {
        match event {
            PluginEvent::ToggleWidget { plugin_id } if plugin_id == PLUGIN_ID => {
                self.state.open.fetch_xor(true, Ordering::SeqCst);
            }
            // Opening an image document anywhere in the app adds it to the
            // gallery and brings the viewer up.
            PluginEvent::DocumentOpened { url } if looks_like_image(url) => {
                let mut gallery = self.state.gallery.lock().expect("gallery lock poisoned");
                if !gallery.urls.contains(url) {
                    gallery.urls.push(url.clone());
                }
                gallery.index = gallery.urls.len() - 1;
                self.state.open.store(true, Ordering::SeqCst);
            }
            _ => {}
        }
    }

    fn render(&self, _props: &serde_json::Value) -> Result<Vec<String>> {
        if !self.state.open.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        let gallery = self.state.gallery.lock().expect("gallery lock poisoned");
        if gallery.urls.is_empty() {
            return Ok(vec!["No images loaded".to_string()]);
        }
        Ok(vec![
            gallery.urls[gallery.index].clone(),
            format!("{} / {}", gallery.index + 1, gallery.urls.len()),
        ])
    }
}

struct ImageViewerTrigger {
    bus: EventBus,
}

impl SlotWidget for ImageViewerTrigger {
    fn title(&self) -> &str {
        "Image Viewer"
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
        Ok(vec!["Open image viewer".to_string()])
    }
}

/// Gallery plugin for image URLs surfaced by the chat or the knowledge
/// panel.
pub struct ImageViewerPlugin {
    manifest: PluginManifest,
    state: Arc<ViewerState>,
}

impl ImageViewerPlugin {
    pub fn new() -> Self {
        Self {
            manifest: PluginManifest::new(PLUGIN_ID, "Image Viewer", "1.0")
                .with_description("Overlay image gallery"),
            state: Arc::new(ViewerState {
                open: AtomicBool::new(false),
                gallery: Mutex::new(GalleryState::default()),
            }),
        }
    }

    /// Replace the gallery contents and reset the cursor.
    pub fn show(&self, urls: Vec<String>) {
        let mut gallery = self.state.gallery.lock().expect("gallery lock poisoned");
        gallery.urls = urls;
        gallery.index = 0;
        self.state
            .open
            .store(!gallery.urls.is_empty(), Ordering::SeqCst);
    }

    /// Advance the cursor, wrapping at the end.
    pub fn next(&self) {
        let mut gallery = self.state.gallery.lock().expect("gallery lock poisoned");
        if !gallery.urls.is_empty() {
            gallery.index = (gallery.index + 1) % gallery.urls.len();
        }
    }

    /// Step the cursor back, wrapping at the start.
    pub fn previous(&self) {
        let mut gallery = self.state.gallery.lock().expect("gallery lock poisoned");
        if !gallery.urls.is_empty() {
            gallery.index = (gallery.index + gallery.urls.len() - 1) % gallery.urls.len();
        }
    }

    pub fn current(&self) -> Option<String> {
        let gallery = self.state.gallery.lock().expect("gallery lock poisoned");
        gallery.urls.get(gallery.index).cloned()
    }
}

impl Default for ImageViewerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ImageViewerPlugin {
    fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn init(&self, context: &mut PluginContext) -> Result<()> {
        context.register_slot(
            slots::GLOBAL_OVERLAY,
            Arc::new(ImageViewerWidget {
                state: self.state.clone(),
            }),
        );
        context.register_slot(
            slots::SIDEBAR_ITEM,
            Arc::new(ImageViewerTrigger {
                bus: context.events().clone(),
            }),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_wraps_both_ways() {
        let viewer = ImageViewerPlugin::new();
        viewer.show(vec!["a.png".into(), "b.png".into(), "c.png".into()]);

        viewer.previous();
        assert_eq!(viewer.current().as_deref(), Some("c.png"));
        viewer.next();
        assert_eq!(viewer.current().as_deref(), Some("a.png"));
    }

    #[test]
    fn test_empty_gallery_has_no_current() {
        let viewer = ImageViewerPlugin::new();
        viewer.next();
        assert!(viewer.current().is_none());
    }

    #[test]
    fn test_image_url_detection() {
        assert!(looks_like_image("http://x/pic.PNG"));
        assert!(looks_like_image("http://x/pic.jpg?size=2"));
        assert!(!looks_like_image("http://x/doc.pdf"));
        assert!(!looks_like_image("http://x/no-extension"));
    }
}
