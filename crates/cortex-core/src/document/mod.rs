//! Remote document handling: fetch-to-local-blob loading and viewer state.

mod blob;
mod loader;
mod viewer;

pub use blob::{BlobHandle, BlobStore};
pub use loader::{DocumentFetcher, DocumentState, PdfBlobLoader};
pub use viewer::{FitMode, ViewerState};
