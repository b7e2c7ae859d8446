//! Generation tracking and cancellation
//!
//! Every keystroke starts a new query cycle. Cycles are numbered by a
//! monotonically increasing generation id; starting generation G+1 cancels
//! G's cancellation token before any provider runs, so background work from a
//! superseded cycle can always discover it is stale.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Context value threaded through every provider call and background task of
/// one query cycle. Explicit, never a hidden global.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// Generation this work belongs to
    pub generation: u64,
    /// Cooperative cancellation handle; cancelled when the generation is
    /// superseded
    pub cancel: CancellationToken,
}

/// Allocates generations and owns the current cancellation handle.
///
/// The pair (current id, current token) is swapped under one lock so a
/// freshly spawned task can never observe the new generation id with the old
/// token or vice versa; reads of the current id stay lock-free.
#[derive(Debug)]
pub struct GenerationTracker {
    current: AtomicU64,
    active: Mutex<CancellationToken>,
}

impl Default for GenerationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self {
            current: AtomicU64::new(0),
            active: Mutex::new(CancellationToken::new()),
        }
    }

    /// Start a new generation: cancel the previous token, advance the
    /// counter, install a fresh token. Returns the new cycle's context.
    pub fn begin(&self) -> QueryContext {
        let mut active = self.active.lock().expect("generation lock poisoned");
        active.cancel();
        let token = CancellationToken::new();
        *active = token.clone();
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        QueryContext {
            generation,
            cancel: token,
        }
    }

    /// Most recently started generation
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Whether `generation` is still the live one
    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generations_are_monotonic() {
        let tracker = GenerationTracker::new();
        let a = tracker.begin();
        let b = tracker.begin();
        assert!(b.generation > a.generation);
        assert_eq!(tracker.current(), b.generation);
    }

    #[test]
    fn test_superseding_cancels_predecessor() {
        let tracker = GenerationTracker::new();
        let a = tracker.begin();
        assert!(!a.cancel.is_cancelled());

        let b = tracker.begin();
        assert!(a.cancel.is_cancelled());
        assert!(!b.cancel.is_cancelled());
        assert!(!tracker.is_current(a.generation));
        assert!(tracker.is_current(b.generation));
    }
}
