//! Countdown registry.
//!
//! One shared 1 s clock decrements every registered countdown. A countdown
//! reaching zero is marked expired (kept, not removed) and the expiry
//! callback fires exactly once per crossing. The clock stops itself when no
//! active countdown remains and restarts on the next register.
//!
//! Remaining seconds are a display approximation; drift is accepted and the
//! next full data refresh re-syncs from the server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use asamblea_core::constants::COUNTDOWN_TICK_MS;

/// Callback fired once per countdown expiry with the subject id.
pub type ExpireFn = Arc<dyn Fn(i64) + Send + Sync>;

#[derive(Clone, Copy, Debug)]
struct Entry {
    remaining: u64,
    expired: bool,
}

struct Inner {
    entries: HashMap<i64, Entry>,
    clock: Option<JoinHandle<()>>,
}

/// Tracks every active countdown under one shared clock.
pub struct CountdownRegistry {
    inner: Arc<Mutex<Inner>>,
    on_expire: ExpireFn,
}

impl CountdownRegistry {
    /// Create a registry with the expiry callback.
    pub fn new(on_expire: ExpireFn) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                clock: None,
            })),
            on_expire,
        }
    }

    /// Add or replace a countdown. A zero-second countdown expires
    /// immediately, without waiting for a tick.
    pub fn register(&self, subject: i64, initial_seconds: u64) {
        if initial_seconds == 0 {
            let _ = self.inner.lock().entries.insert(
                subject,
                Entry {
                    remaining: 0,
                    expired: true,
                },
            );
            debug!(subject, "countdown registered already expired");
            (self.on_expire)(subject);
            return;
        }

        let mut inner = self.inner.lock();
        let _ = inner.entries.insert(
            subject,
            Entry {
                remaining: initial_seconds,
                expired: false,
            },
        );
        self.ensure_clock(&mut inner);
    }

    /// Drop one countdown (view replaced or question deleted).
    pub fn remove(&self, subject: i64) {
        let _ = self.inner.lock().entries.remove(&subject);
    }

    /// Stop the clock and drop every entry. Called on logout/teardown so no
    /// timer leaks across sessions.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        if let Some(clock) = inner.clock.take() {
            clock.abort();
        }
        inner.entries.clear();
    }

    /// Remaining seconds for a subject, if registered.
    #[must_use]
    pub fn remaining(&self, subject: i64) -> Option<u64> {
        self.inner.lock().entries.get(&subject).map(|e| e.remaining)
    }

    /// Whether a subject has expired, if registered.
    #[must_use]
    pub fn is_expired(&self, subject: i64) -> Option<bool> {
        self.inner.lock().entries.get(&subject).map(|e| e.expired)
    }

    /// Count of non-expired countdowns.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.inner
            .lock()
            .entries
            .values()
            .filter(|e| !e.expired)
            .count()
    }

    /// Whether the shared clock is running.
    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.inner
            .lock()
            .clock
            .as_ref()
            .is_some_and(|clock| !clock.is_finished())
    }

    /// Start the clock task unless one is already running.
    fn ensure_clock(&self, inner: &mut Inner) {
        if inner.clock.as_ref().is_some_and(|c| !c.is_finished()) {
            return;
        }
        let shared = Arc::clone(&self.inner);
        let on_expire = Arc::clone(&self.on_expire);
        inner.clock = Some(tokio::spawn(tick_loop(shared, on_expire)));
    }
}

/// Decrement every active entry once per tick; fire expiries outside the
/// lock; stop once nothing active remains.
async fn tick_loop(inner: Arc<Mutex<Inner>>, on_expire: ExpireFn) {
    loop {
        tokio::time::sleep(Duration::from_millis(COUNTDOWN_TICK_MS)).await;

        let mut just_expired = Vec::new();
        let active_left = {
            let mut guard = inner.lock();
            for (subject, entry) in &mut guard.entries {
                if entry.expired {
                    continue;
                }
                entry.remaining = entry.remaining.saturating_sub(1);
                if entry.remaining == 0 {
                    entry.expired = true;
                    just_expired.push(*subject);
                }
            }
            let active = guard.entries.values().any(|e| !e.expired);
            if !active {
                // The clock stops itself rather than idling.
                guard.clock = None;
            }
            active
        };

        for subject in just_expired {
            debug!(subject, "countdown expired");
            on_expire(subject);
        }

        if !active_left {
            return;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
