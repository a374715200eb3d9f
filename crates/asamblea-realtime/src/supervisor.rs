//! Per-role connection lifecycle.
//!
//! One supervisor per role; admin and voter streams keep independent retry
//! counters over the same policy. A successful connect resets the counter.
//! After the attempt ceiling the exhaustion callback fires once and the
//! supervisor goes quiet until a fresh session starts it again.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use asamblea_core::models::Role;
use asamblea_core::retry::{next_delay_ms, should_retry};

use crate::channel::Channel;
use crate::router::FrameSink;

/// Callback invoked once when reconnection gives up.
pub type ExhaustedFn = Arc<dyn Fn() + Send + Sync>;

/// Owns the connect/read/reconnect loop for one role.
pub struct ChannelSupervisor {
    role: Role,
    slot: Mutex<Option<JoinHandle<()>>>,
}

impl ChannelSupervisor {
    /// Create an idle supervisor for a role.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            slot: Mutex::new(None),
        }
    }

    /// Role this supervisor serves.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether a connection loop is currently running.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.slot
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start the connection loop. A no-op while one is already running —
    /// at most one connection exists per role.
    pub fn start(&self, url: String, sink: Arc<dyn FrameSink>, on_exhausted: ExhaustedFn) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            warn!(role = self.role.as_str(), "connection already open, ignoring");
            return;
        }
        let role = self.role;
        *slot = Some(tokio::spawn(run_loop(role, url, sink, on_exhausted)));
    }

    /// Stop the connection loop, if any. Safe to call repeatedly.
    pub fn stop(&self) {
        if let Some(handle) = self.slot.lock().take() {
            handle.abort();
            info!(role = self.role.as_str(), "channel stopped");
        }
    }
}

/// Connect, read until closed, back off, retry. Exits on exhaustion.
async fn run_loop(role: Role, url: String, sink: Arc<dyn FrameSink>, on_exhausted: ExhaustedFn) {
    let mut attempt: u32 = 0;
    loop {
        match Channel::open(&url).await {
            Ok(mut channel) => {
                info!(role = role.as_str(), "channel connected");
                attempt = 0;
                while let Some(text) = channel.next_text().await {
                    sink.dispatch(&text);
                }
                info!(role = role.as_str(), "channel closed");
            }
            Err(e) => {
                warn!(role = role.as_str(), error = %e, "channel connect failed");
            }
        }

        if !should_retry(attempt) {
            warn!(role = role.as_str(), attempt, "reconnect attempts exhausted");
            on_exhausted();
            return;
        }
        attempt += 1;
        let delay = next_delay_ms(attempt);
        info!(role = role.as_str(), attempt, delay_ms = delay, "reconnecting");
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
