//! Session-scoped state synchronization.

mod controller;

pub use controller::{QuerySettings, SessionSyncController, ViewState};
