//! Needs-refresh signal between catalog views
//!
//! Replaces an ambient module-level flag with an explicit channel that has a
//! defined lifecycle:
//! - **publishers**: the cloning pipeline raises the signal after a
//!   successful clone (any other writer of the catalog may too)
//! - **consumers**: a catalog view calls [`RefreshSignal::take`] on focus;
//!   the first consumer to observe the signal clears it and refetches
//!
//! Clones share the underlying state, so one signal can be handed to any
//! number of publishers and consumers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide "catalog needs refresh on next focus" signal
#[derive(Debug, Clone, Default)]
pub struct RefreshSignal {
    stale: Arc<AtomicBool>,
}

impl RefreshSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the catalog stale
    pub fn raise(&self) {
        self.stale.store(true, Ordering::SeqCst);
    }

    /// Observe and clear: returns true exactly once per raise
    pub fn take(&self) -> bool {
        self.stale.swap(false, Ordering::SeqCst)
    }

    /// Peek without clearing
    pub fn is_raised(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }
}
