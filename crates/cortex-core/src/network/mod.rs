//! HTTP plumbing shared by every backend call.

mod client;
mod connectivity;

pub use client::{normalize_detail, HttpClient};
pub use connectivity::{AtomicConnectivity, ConnectivityState};
