//! # Cooperative Cancellation Contexts
//!
//! A [`CancellationContext`] is a shared cancel flag behind a context handle.
//! The caller cancels it (typically from another thread); the operation
//! observes the flag only at its own checkpoints, never preemptively. There
//! is no hard timeout primitive at this layer; callers layer timeouts on top
//! by cancelling the context themselves.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cooperative cancellation flag.
///
/// Cheap to share: operations hold it behind an `Arc` issued by the handle
/// table and poll [`checkpoint`](Self::checkpoint) between discrete steps.
#[derive(Debug, Default)]
pub struct CancellationContext {
    cancelled: AtomicBool,
}

impl CancellationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Safe to call from any thread, any number of
    /// times; cancellation is permanent for the lifetime of the context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Checkpoint for a long-running operation: fails with a `Cancelled`
    /// error naming `operation` if cancellation has been requested.
    pub fn checkpoint(&self, operation: &str) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::cancelled(operation))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_passes_until_cancelled() {
        let context = CancellationContext::new();
        assert!(context.checkpoint("pull image").is_ok());

        context.cancel();
        let err = context.checkpoint("pull image").unwrap_err();
        assert_eq!(err.kind(), "Cancelled");
    }
}
