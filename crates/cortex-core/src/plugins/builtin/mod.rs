//! The built-in sidebar widgets, shipped as ordinary plugins.
//!
//! Each registers an overlay panel into `global-overlay` and a trigger row
//! into `sidebar-item`; the trigger toggles its panel through the typed
//! event bus.

mod calculator;
mod drive;
mod image_viewer;
mod notes;

pub use calculator::CalculatorPlugin;
pub use drive::{DriveEntry, DrivePickerPlugin, DriveSource, MockDriveSource, NullDriveSource};
pub use image_viewer::ImageViewerPlugin;
pub use notes::NotesPlugin;
