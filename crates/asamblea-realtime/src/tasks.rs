//! Named periodic refresh tasks.
//!
//! Historically every screen kept its own ad-hoc interval (vote polling,
//! aforo polling, connected-user refresh) and some leaked across
//! navigations. Here they share one scheduler: each task is started on
//! screen-enter, replaced if re-registered under the same name, and stopped
//! on screen-exit or teardown.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Registry of named periodic jobs.
#[derive(Default)]
pub struct RefreshScheduler {
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl RefreshScheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a periodic job. The first run happens one period after start
    /// (screen-enter already does its own initial load). Re-registering a
    /// name replaces the previous job.
    pub fn start<F, Fut>(&self, name: &str, period: Duration, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                job().await;
            }
        });
        let mut tasks = self.tasks.lock();
        if let Some(previous) = tasks.insert(name.to_string(), handle) {
            debug!(name, "replacing refresh task");
            previous.abort();
        }
    }

    /// Stop one job. Returns whether it existed.
    pub fn stop(&self, name: &str) -> bool {
        match self.tasks.lock().remove(name) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Stop everything. Called on logout/teardown.
    pub fn stop_all(&self) {
        let mut tasks = self.tasks.lock();
        for (name, handle) in tasks.drain() {
            debug!(name = %name, "stopping refresh task");
            handle.abort();
        }
    }

    /// Names of currently running jobs.
    #[must_use]
    pub fn active(&self) -> Vec<String> {
        self.tasks
            .lock()
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.lock().drain() {
            handle.abort();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
