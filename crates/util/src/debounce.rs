//! Quiet-window debouncing for bursty interaction signals.
//!
//! A [`Debouncer`] wraps an action behind a timer: each call cancels any
//! pending execution and schedules a fresh one, so only the most recent
//! call within the quiet window survives. Earlier calls are dropped
//! entirely, not queued. The wrapped action runs fire-and-forget on the
//! tokio runtime; nothing is returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

/// Default quiet window for free-form inputs.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Short quiet window for selection-style inputs that must feel instant.
pub const SELECTION_DEBOUNCE: Duration = Duration::from_millis(50);

/// Rate limiter wrapping a one-argument action.
///
/// Two debouncers never share timers: each owns its pending task. Dropping
/// a debouncer aborts whatever is still pending.
pub struct Debouncer<T> {
    window: Duration,
    action: Arc<dyn Fn(T) + Send + Sync>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Wrap `action` with the given quiet window.
    pub fn new(window: Duration, action: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            window,
            action: Arc::new(action),
            pending: None,
        }
    }

    /// Wrap `action` with the default 500 ms window.
    pub fn with_default_window(action: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self::new(DEFAULT_DEBOUNCE, action)
    }

    /// Schedule the action with `arg`, cancelling any earlier pending call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn call(&mut self, arg: T) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
            trace!("debounce superseded earlier pending call");
        }
        let action = Arc::clone(&self.action);
        let window = self.window;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            action(arg);
        }));
    }

    /// Quiet window this debouncer was built with.
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_debouncer(window: Duration) -> (Debouncer<String>, Arc<Mutex<Vec<String>>>) {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let debouncer = Debouncer::new(window, move |arg: String| {
            sink.lock().unwrap().push(arg);
        });
        (debouncer, seen)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_last_call() {
        let (mut debouncer, seen) = recording_debouncer(Duration::from_millis(500));

        for arg in ["a", "b", "c"] {
            debouncer.call(arg.to_string());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(*seen.lock().unwrap(), vec!["c".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn calls_outside_the_window_each_fire() {
        let (mut debouncer, seen) = recording_debouncer(Duration::from_millis(50));

        debouncer.call("first".to_string());
        tokio::time::sleep(Duration::from_millis(80)).await;
        debouncer.call("second".to_string());
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn independent_debouncers_do_not_interfere() {
        let (mut left, left_seen) = recording_debouncer(Duration::from_millis(100));
        let (mut right, right_seen) = recording_debouncer(Duration::from_millis(100));

        left.call("l".to_string());
        right.call("r".to_string());
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(*left_seen.lock().unwrap(), vec!["l".to_string()]);
        assert_eq!(*right_seen.lock().unwrap(), vec!["r".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_pending_call() {
        let (mut debouncer, seen) = recording_debouncer(Duration::from_millis(100));
        debouncer.call("doomed".to_string());
        drop(debouncer);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(seen.lock().unwrap().is_empty());
    }
}
