use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Requests [`Trainer::train()`](super::Trainer::train) to stop.
///
/// The flag is checked at the top of every iteration; calls in flight complete
/// before the loop returns.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Requests to stop.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if stopping was requested.
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(super) fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
