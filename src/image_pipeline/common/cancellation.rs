//! Cooperative cancellation shared between a caller and a render worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use enough::{Stop, StopReason};

/// Clonable cancellation flag. Every clone observes the same state.
///
/// Decoders poll it between rows and blocks through [`Stop::check`]; nothing
/// is aborted forcibly.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Stop for CancellationToken {
    fn check(&self) -> Result<(), StopReason> {
        if self.is_cancelled() {
            Err(StopReason::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(observer.check().is_ok());

        token.cancel();
        assert!(observer.is_cancelled());
        assert!(matches!(observer.check(), Err(StopReason::Cancelled)));
    }
}
