//! Single-shot cancellable timers for debounce, retry, and error display.

use std::future::Future;
use std::time::Duration;

use tokio::task::AbortHandle;

/// A single-shot timer whose pending fire can be cancelled or superseded.
///
/// Scheduling while a fire is pending cancels the previous one, so only the
/// last scheduled action within a window runs. Dropping the timer aborts any
/// pending fire.
#[derive(Debug, Default)]
pub struct CancellableTimer {
    pending: Option<AbortHandle>,
}

impl CancellableTimer {
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Schedule `action` to run after `delay`, cancelling any pending fire.
    pub fn schedule<F>(&mut self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });
        self.pending = Some(task.abort_handle());
    }

    /// Cancel the pending fire, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for CancellableTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
