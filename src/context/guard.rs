//! Process-wide claim on the single active context.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::context::registry::WiringError;

/// Set while an application context is alive in this process.
static CONTEXT_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Proof that the holder owns the process's only active context.
///
/// Released when dropped.
#[derive(Debug)]
pub struct ContextGuard {
    _private: (),
}

impl ContextGuard {
    /// Claim the slot, failing if another context is active.
    pub fn acquire() -> Result<Self, WiringError> {
        CONTEXT_ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { _private: () })
            .map_err(|_| WiringError::ContextActive)
    }

    /// Whether any context currently holds the slot.
    pub fn is_held() -> bool {
        CONTEXT_ACTIVE.load(Ordering::Acquire)
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CONTEXT_ACTIVE.store(false, Ordering::Release);
        tracing::trace!("Context guard released");
    }
}
