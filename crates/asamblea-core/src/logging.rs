//! Structured logging with `tracing`.
//!
//! The client logs to stderr only; nothing user-visible goes through this
//! path (user-facing messages use the notification surface). Component
//! context travels via tracing fields, not message prefixes.

/// Initialize the global tracing subscriber.
///
/// Call once at startup. Subsequent calls are no-ops. `RUST_LOG` overrides
/// the provided default level.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init is a no-op if a subscriber is already set
    let _ = subscriber.try_init();
}
