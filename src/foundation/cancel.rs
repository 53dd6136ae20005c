use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{TripReelError, TripReelResult};

/// Cooperative cancellation signal shared between a caller and a running generation.
///
/// Clones observe the same flag. The run polls it once per frame and while waiting on bitmaps.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the "not cancelled" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Return `true` once [`CancelToken::cancel`] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Return [`TripReelError::Cancelled`] when cancellation was requested.
    pub fn check(&self) -> TripReelResult<()> {
        if self.is_cancelled() {
            return Err(TripReelError::Cancelled);
        }
        Ok(())
    }
}
