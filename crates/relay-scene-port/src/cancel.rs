// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cooperative cancellation.
//!
//! The exporter polls once per top-level object. A poll is a non-blocking
//! check; nothing waits on it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Source of the per-object cancellation poll.
pub trait Cancellation {
    /// Returns `true` once the current cycle should stop.
    fn is_cancelled(&mut self) -> bool;
}

impl<F> Cancellation for F
where
    F: FnMut() -> bool,
{
    fn is_cancelled(&mut self) -> bool {
        self()
    }
}

/// Shared flag a host UI thread can raise while a cycle runs.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Lower the flag before the next cycle.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Whether the flag is raised.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Cancellation for CancelFlag {
    fn is_cancelled(&mut self) -> bool {
        self.is_set()
    }
}

/// Never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&mut self) -> bool {
        false
    }
}
