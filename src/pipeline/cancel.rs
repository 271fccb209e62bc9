use crate::foundation::error::{VoxframeError, VoxframeResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between a caller and one synthesis run.
///
/// Once set it stays set. The synthesizer checks it between audio chunks, the compositor on every
/// tick, and the orchestrator before finalizing.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the token is set.
    pub fn check(&self) -> VoxframeResult<()> {
        if self.is_cancelled() {
            return Err(VoxframeError::Cancelled);
        }
        Ok(())
    }
}
