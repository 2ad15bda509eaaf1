//! Connectivity state derived from request outcomes.
//!
//! The client never probes; the background poll doubles as the liveness
//! signal. A successful poll marks the backend online, a connectivity
//! failure marks it offline. Stale-but-available data stays displayed
//! either way.

use std::sync::atomic::{AtomicU8, Ordering};

/// Backend reachability as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Online = 0,
    Offline = 1,
    /// Initial state before the first request completes.
    Unknown = 2,
}

impl std::fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectivityState::Online => write!(f, "online"),
            ConnectivityState::Offline => write!(f, "offline"),
            ConnectivityState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Atomic wrapper for [`ConnectivityState`].
#[derive(Debug)]
pub struct AtomicConnectivity(AtomicU8);

impl AtomicConnectivity {
    pub fn new() -> Self {
        Self(AtomicU8::new(ConnectivityState::Unknown as u8))
    }

    pub fn load(&self) -> ConnectivityState {
        match self.0.load(Ordering::SeqCst) {
            0 => ConnectivityState::Online,
            1 => ConnectivityState::Offline,
            _ => ConnectivityState::Unknown,
        }
    }

    pub fn store(&self, state: ConnectivityState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.load() == ConnectivityState::Online
    }
}

impl Default for AtomicConnectivity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unknown() {
        let connectivity = AtomicConnectivity::new();
        assert_eq!(connectivity.load(), ConnectivityState::Unknown);
        assert!(!connectivity.is_online());
    }

    #[test]
    fn test_store_and_load() {
        let connectivity = AtomicConnectivity::new();
        connectivity.store(ConnectivityState::Online);
        assert!(connectivity.is_online());
        connectivity.store(ConnectivityState::Offline);
        assert_eq!(connectivity.load(), ConnectivityState::Offline);
    }
}
