//! Shared constants.
//!
//! Timing values mirror what the backend and the deployed clients agree on;
//! changing them changes observable behavior (dedup windows, reconnect
//! cadence), so they live in one place.

/// Maximum push-channel reconnect attempts before giving up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Base reconnect delay in milliseconds.
pub const RECONNECT_BASE_DELAY_MS: u64 = 1000;

/// Reconnect delay ceiling in milliseconds.
pub const RECONNECT_MAX_DELAY_MS: u64 = 30_000;

/// Countdown clock period in milliseconds.
pub const COUNTDOWN_TICK_MS: u64 = 1000;

/// Suppression window for repeated `question_expired` events, per question.
pub const QUESTION_EXPIRED_DEDUP_MS: u64 = 5000;

/// Delay before leaving the session after a reset or forced disconnect,
/// long enough for the user to read the message.
pub const SESSION_END_DELAY_MS: u64 = 2000;

/// Coefficient percentage at which the assembly has quorum.
pub const QUORUM_THRESHOLD_PERCENT: f64 = 51.0;

/// Durable storage key for the admin bearer token.
pub const ADMIN_TOKEN_KEY: &str = "admin_token";

/// Durable storage key for the voter bearer token.
pub const VOTER_TOKEN_KEY: &str = "voter_token";

/// Access code reserved for demo mode. Sessions opened with it never touch
/// backend state and never open a live channel.
pub const DEFAULT_DEMO_CODE: &str = "0-000";

/// Fallback organization name used in report filenames when none is
/// configured.
pub const DEFAULT_CONJUNTO: &str = "Conjunto Residencial";
