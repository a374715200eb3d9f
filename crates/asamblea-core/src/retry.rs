//! Push-channel reconnection policy.
//!
//! Pure, sync building blocks: the realtime supervisor (which has access to
//! tokio) drives the actual sleep/retry loop, keyed independently per role.
//! Exponential backoff, capped, with a hard attempt ceiling — on exhaustion
//! the user is told to reload manually and no further attempts happen until
//! a fresh session is created.

use crate::constants::{MAX_RECONNECT_ATTEMPTS, RECONNECT_BASE_DELAY_MS, RECONNECT_MAX_DELAY_MS};

/// Whether another reconnect attempt is allowed.
#[must_use]
pub fn should_retry(attempt: u32) -> bool {
    attempt < MAX_RECONNECT_ATTEMPTS
}

/// Backoff delay for the given zero-based attempt index.
///
/// Formula: `min(1000 * 2^attempt, 30_000)` milliseconds.
#[must_use]
pub fn next_delay_ms(attempt: u32) -> u64 {
    RECONNECT_BASE_DELAY_MS
        .saturating_mul(1u64 << attempt.min(31))
        .min(RECONNECT_MAX_DELAY_MS)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
