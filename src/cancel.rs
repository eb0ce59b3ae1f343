// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Cooperative cancellation flag shared between the presentation thread and
//! one background task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation signal checked by background work at chunk boundaries.
///
/// Cloning shares the flag. Raising it never interrupts work preemptively;
/// the task notices it the next time it calls [`CancelSignal::is_raised`].
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_flag() {
        let signal = CancelSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_raised());

        signal.raise();
        assert!(observer.is_raised());
    }
}
