use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation handle for a running scan.
///
/// Cancelling stops further dispatch immediately; probes already running
/// finish and their outcomes are still ingested. The scan then aborts
/// instead of correlating and `run` returns a cancelled error.
#[derive(Debug, Clone, Default)]
pub struct ScanHandle {
    cancelled: Arc<AtomicBool>,
}

impl ScanHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
