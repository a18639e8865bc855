//! Cooperative cancellation for long-running computations.
//!
//! ```
//! use sparse_life::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let worker = token.clone();
//!
//! token.cancel();
//! assert!(worker.is_cancelled());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::LifeError;

/// Shared cancellation flag.
///
/// Clone it to hand it to a worker; call `cancel()` from the owner and the
/// worker observes it at its next check.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation has been signaled.
    #[inline]
    pub fn check(&self) -> Result<(), LifeError> {
        if self.is_cancelled() {
            Err(LifeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Guard that cancels this token when dropped.
    pub fn drop_guard(self) -> CancelOnDrop {
        CancelOnDrop { token: Some(self) }
    }
}

/// Cancels its token on drop, tying a computation to the lifetime of
/// whatever owns the guard (e.g. a request future).
#[derive(Debug)]
pub struct CancelOnDrop {
    token: Option<CancellationToken>,
}

impl CancelOnDrop {
    /// Release the guard without cancelling.
    pub fn disarm(mut self) -> CancellationToken {
        self.token.take().unwrap_or_default()
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}
