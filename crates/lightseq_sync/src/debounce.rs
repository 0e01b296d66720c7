//! Cancellable, re-armable delayed task.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::warn;

/// Runs a task once a quiet period has passed since the last `schedule` call.
///
/// Re-scheduling cancels the timer of the previous call. Only the sleep is
/// cancellable: once the window expires the task is spawned on its own, so a
/// later `schedule` or `cancel` never aborts work already in progress.
pub struct Debouncer {
    delay: Duration,
    runtime: Option<Handle>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Creates a debouncer. Captures the current tokio runtime, if any.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            runtime: Handle::try_current().ok(),
            timer: Mutex::new(None),
        }
    }

    /// The quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The runtime timers run on: the one captured at construction, else the
    /// current one.
    pub fn runtime(&self) -> Option<Handle> {
        self.runtime.clone().or_else(|| Handle::try_current().ok())
    }

    /// (Re)arms the timer. Returns false when no runtime is available to run
    /// the timer on.
    pub fn schedule<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Some(runtime) = self.runtime() else {
            warn!("no tokio runtime; debounced task not scheduled");
            return false;
        };

        let delay = self.delay;
        let spawner = runtime.clone();
        let timer = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            spawner.spawn(task);
        });

        if let Some(previous) = self.timer.lock().replace(timer) {
            previous.abort();
        }
        true
    }

    /// Cancels a pending timer. Returns true if one was still waiting.
    pub fn cancel(&self) -> bool {
        match self.timer.lock().take() {
            Some(timer) => {
                let waiting = !timer.is_finished();
                timer.abort();
                waiting
            }
            None => false,
        }
    }

    /// Returns true while a timer is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.timer
            .lock()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
