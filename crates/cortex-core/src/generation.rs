//! Generation counter for dropping stale async responses.
//!
//! There is no true request cancellation in this client; instead every
//! in-flight request is tagged with the generation of the resource it
//! targets (session id, document URL). The generation bumps synchronously
//! whenever the resource changes, so a response that resolves late can be
//! recognized as stale and discarded instead of clobbering newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A shared, monotonically increasing generation counter.
///
/// Clones share the same underlying counter. `bump()` on any clone is
/// observed by every guard taken from any clone.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    current: Arc<AtomicU64>,
}

impl Generation {
    pub fn new() -> Self {
        Self {
            current: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Invalidate all outstanding guards and return the new generation.
    pub fn bump(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The current generation value.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Take a guard pinned to the current generation. Hold it across an
    /// await and call [`GenerationGuard::check`] before applying the result.
    pub fn guard(&self) -> GenerationGuard {
        GenerationGuard {
            cell: self.current.clone(),
            observed: self.current(),
        }
    }
}

/// A snapshot of the generation at the moment a request was issued.
#[derive(Debug, Clone)]
pub struct GenerationGuard {
    cell: Arc<AtomicU64>,
    observed: u64,
}

impl GenerationGuard {
    /// Whether the observed generation is still the live one.
    pub fn is_current(&self) -> bool {
        self.cell.load(Ordering::SeqCst) == self.observed
    }

    /// The generation this guard was taken at.
    pub fn observed(&self) -> u64 {
        self.observed
    }

    /// Error if the resource was superseded while the request was in flight.
    pub fn check(&self) -> Result<(), StaleError> {
        if self.is_current() {
            Ok(())
        } else {
            Err(StaleError {
                observed: self.observed,
                current: self.cell.load(Ordering::SeqCst),
            })
        }
    }
}

/// Error returned when a guarded response resolved after its target changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleError {
    pub observed: u64,
    pub current: u64,
}

impl std::fmt::Display for StaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "response from generation {} is stale (current {})",
            self.observed, self.current
        )
    }
}

impl std::error::Error for StaleError {}

impl From<StaleError> for crate::error::CortexError {
    fn from(err: StaleError) -> Self {
        crate::error::CortexError::Stale {
            observed: err.observed,
            current: err.current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_guard_is_current() {
        let generation = Generation::new();
        let guard = generation.guard();
        assert!(guard.is_current());
        assert!(guard.check().is_ok());
    }

    #[test]
    fn test_bump_invalidates_outstanding_guards() {
        let generation = Generation::new();
        let guard = generation.guard();
        generation.bump();
        assert!(!guard.is_current());
        assert!(guard.check().is_err());
    }

    #[test]
    fn test_guard_after_bump_is_current() {
        let generation = Generation::new();
        generation.bump();
        let guard = generation.guard();
        assert!(guard.is_current());
    }

    #[test]
    fn test_clones_share_the_counter() {
        let generation = Generation::new();
        let clone = generation.clone();
        let guard = generation.guard();
        clone.bump();
        assert!(!guard.is_current());
        assert_eq!(generation.current(), clone.current());
    }

    #[test]
    fn test_stale_error_reports_generations() {
        let generation = Generation::new();
        let guard = generation.guard();
        generation.bump();
        generation.bump();
        let err = guard.check().unwrap_err();
        assert_eq!(err.observed, 0);
        assert_eq!(err.current, 2);
    }
}
