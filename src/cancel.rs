//! Cooperative cancellation for traversals

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that asks a running traversal to stop
///
/// The token is passed to every visit callback so callers can cancel from
/// inside a callback or from another thread holding a clone. The walker checks
/// it before each root and before each directory entry; a cancelled traversal
/// fails with [`WalkErrorKind::Cancelled`](crate::WalkErrorKind::Cancelled).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; visible to every clone of this token
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
