//! Cancellable timers owned by a screen.
//!
//! Screens that simulate remote events (a driver being found, the trip
//! starting) schedule them as tokio tasks. The tasks are collected in a
//! [`ScreenTimers`] that aborts whatever is still pending when the screen
//! closes or is dropped, so no event fires after its screen is gone.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// A single scheduled event.
#[derive(Debug)]
pub struct TimerHandle {
    label: &'static str,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Name given at scheduling time.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Whether the event has fired (or was aborted).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Abort the event if it has not fired yet.
    pub fn cancel(&self) {
        if !self.task.is_finished() {
            trace!(timer = self.label, "Cancelling timer");
            self.task.abort();
        }
    }
}

/// All timers belonging to one screen.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct ScreenTimers {
    handles: Vec<TimerHandle>,
}

impl ScreenTimers {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` once `delay` has elapsed, unless cancelled first.
    pub fn after<F>(&mut self, label: &'static str, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        debug!(timer = label, ?delay, "Scheduling timer");
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trace!(timer = label, "Timer fired");
            action();
        });
        self.handles.push(TimerHandle { label, task });
    }

    /// Number of timers that have not fired yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Total number of timers scheduled.
    #[must_use]
    pub fn count(&self) -> usize {
        self.handles.len()
    }

    /// Abort every pending timer.
    pub fn cancel_all(&mut self) {
        for handle in &self.handles {
            handle.cancel();
        }
        self.handles.clear();
    }
}

impl Drop for ScreenTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timers = ScreenTimers::new();

        let counter = Arc::clone(&fired);
        timers.after("tick", Duration::from_secs(3), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(timers.count(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(timers.pending(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timers.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_stops_pending() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timers = ScreenTimers::new();

        for secs in [1, 5, 10] {
            let counter = Arc::clone(&fired);
            timers.after("tick", Duration::from_secs(secs), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        timers.cancel_all();
        assert_eq!(timers.count(), 0);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let mut timers = ScreenTimers::new();
            let counter = Arc::clone(&fired);
            timers.after("tick", Duration::from_secs(1), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_label() {
        let mut timers = ScreenTimers::new();
        timers.after("driver found", Duration::from_secs(1), || {});
        assert_eq!(timers.handles[0].label(), "driver found");
    }
}
