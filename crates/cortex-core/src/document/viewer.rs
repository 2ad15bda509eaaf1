//! Page, zoom and fit state for the document viewer.

use crate::config::ViewerConfig;

/// How the render scale is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    FitWidth,
    FitHeight,
    /// Fixed user-chosen zoom.
    #[default]
    Manual,
}

/// Viewer navigation state. Pages are 1-indexed and clamped to
/// `[1, num_pages]`; manual zoom is clamped to the configured bounds no
/// matter how many steps are issued.
#[derive(Debug, Clone)]
pub struct ViewerState {
    page: u32,
    /// 0 until the renderer reports the page count.
    num_pages: u32,
    zoom: f32,
    fit: FitMode,
    /// Scale actually used on the last render; anchors the switch to
    /// manual zoom.
    last_computed_scale: f32,
}

impl ViewerState {
    pub fn new() -> Self {
        Self {
            page: 1,
            num_pages: 0,
            zoom: ViewerConfig::DEFAULT_ZOOM,
            fit: FitMode::Manual,
            last_computed_scale: ViewerConfig::DEFAULT_ZOOM,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn fit(&self) -> FitMode {
        self.fit
    }

    /// Called from the renderer's load callback.
    pub fn set_num_pages(&mut self, num_pages: u32) {
        self.num_pages = num_pages;
        self.page = self.clamp_page(self.page);
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = self.clamp_page(page);
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page.saturating_add(1));
    }

    pub fn previous_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    pub fn zoom_in(&mut self) {
        self.step_zoom(ViewerConfig::ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.step_zoom(-ViewerConfig::ZOOM_STEP);
    }

    /// Switch fit policy. Entering manual mode anchors the scale that was
    /// last actually rendered, so zooming continues from what the user
    /// sees instead of snapping back to a stored value.
    pub fn set_fit(&mut self, fit: FitMode) {
        if fit == FitMode::Manual && self.fit != FitMode::Manual {
            self.zoom = clamp_zoom(self.last_computed_scale);
        }
        self.fit = fit;
    }

    /// Scale to render at, given the measured viewport and the page's
    /// natural size. Records the result for manual-mode anchoring.
    pub fn scale_for(&mut self, viewport: (f32, f32), page_size: (f32, f32)) -> f32 {
        let (viewport_w, viewport_h) = viewport;
        let (page_w, page_h) = page_size;
        let scale = match self.fit {
            FitMode::FitWidth if page_w > 0.0 => viewport_w / page_w,
            FitMode::FitHeight if page_h > 0.0 => viewport_h / page_h,
            FitMode::Manual => self.zoom,
            _ => self.zoom,
        };
        self.last_computed_scale = scale;
        scale
    }

    fn step_zoom(&mut self, delta: f32) {
        // Zoom buttons act on the manual scale; stepping out of a fit mode
        // first anchors the currently rendered scale.
        if self.fit != FitMode::Manual {
            self.set_fit(FitMode::Manual);
        }
        self.zoom = clamp_zoom(self.zoom + delta);
    }

    fn clamp_page(&self, page: u32) -> u32 {
        let upper = self.num_pages.max(1);
        page.clamp(1, upper)
    }
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_zoom(zoom: f32) -> f32 {
    zoom.clamp(ViewerConfig::MIN_ZOOM, ViewerConfig::MAX_ZOOM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamps_to_document_bounds() {
        let mut viewer = ViewerState::new();
        viewer.set_num_pages(5);

        viewer.set_page(99);
        assert_eq!(viewer.page(), 5);
        viewer.set_page(0);
        assert_eq!(viewer.page(), 1);

        viewer.set_page(5);
        viewer.next_page();
        assert_eq!(viewer.page(), 5);
        viewer.set_page(1);
        viewer.previous_page();
        assert_eq!(viewer.page(), 1);
    }

    #[test]
    fn test_page_count_shrink_pulls_page_back() {
        let mut viewer = ViewerState::new();
        viewer.set_num_pages(10);
        viewer.set_page(10);
        viewer.set_num_pages(3);
        assert_eq!(viewer.page(), 3);
    }

    #[test]
    fn test_zoom_is_clamped_under_repeated_steps() {
        let mut viewer = ViewerState::new();
        for _ in 0..100 {
            viewer.zoom_in();
        }
        assert!((viewer.zoom() - ViewerConfig::MAX_ZOOM).abs() < f32::EPSILON);

        for _ in 0..100 {
            viewer.zoom_out();
        }
        assert!((viewer.zoom() - ViewerConfig::MIN_ZOOM).abs() < f32::EPSILON);
    }

    #[test]
    fn test_fit_width_derives_scale_from_viewport() {
        let mut viewer = ViewerState::new();
        viewer.set_fit(FitMode::FitWidth);
        let scale = viewer.scale_for((1200.0, 800.0), (600.0, 900.0));
        assert!((scale - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_switching_to_manual_anchors_rendered_scale() {
        let mut viewer = ViewerState::new();
        viewer.set_fit(FitMode::FitWidth);
        viewer.scale_for((1200.0, 800.0), (600.0, 900.0)); // renders at 2.0

        viewer.set_fit(FitMode::Manual);
        assert!((viewer.zoom() - 2.0).abs() < f32::EPSILON);

        viewer.zoom_in();
        assert!((viewer.zoom() - 2.1).abs() < 1e-5);
    }

    #[test]
    fn test_anchored_scale_is_clamped() {
        let mut viewer = ViewerState::new();
        viewer.set_fit(FitMode::FitWidth);
        // Tiny page in a huge viewport computes far beyond the max zoom.
        viewer.scale_for((5000.0, 800.0), (100.0, 100.0));
        viewer.set_fit(FitMode::Manual);
        assert!((viewer.zoom() - ViewerConfig::MAX_ZOOM).abs() < f32::EPSILON);
    }

    #[test]
    fn test_zoom_step_in_fit_mode_anchors_first() {
        let mut viewer = ViewerState::new();
        viewer.set_fit(FitMode::FitHeight);
        viewer.scale_for((1200.0, 900.0), (600.0, 600.0)); // renders at 1.5
        viewer.zoom_in();
        assert_eq!(viewer.fit(), FitMode::Manual);
        assert!((viewer.zoom() - 1.6).abs() < 1e-5);
    }
}
