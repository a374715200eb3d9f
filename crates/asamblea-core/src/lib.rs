//! Foundation types for the assembly voting client.
//!
//! This crate holds everything the higher layers share:
//!
//! - [`models`]: Domain types mirrored from the backend wire format
//!   (questions, participants, aforo, results, session identity)
//! - [`messages`]: Push-channel frame envelope and the typed voter/admin
//!   event enums the router dispatches on
//! - [`retry`]: Reconnection policy (attempt ceiling, exponential backoff)
//! - [`validate`]: Pre-network input validation (access codes, question
//!   creation payloads)
//! - [`logging`]: `tracing` subscriber setup
//!
//! Nothing here performs I/O; the REST surface lives in `asamblea-client`
//! and the push channel in `asamblea-realtime`.

pub mod constants;
pub mod logging;
pub mod messages;
pub mod models;
pub mod retry;
pub mod validate;

pub use messages::{AdminEvent, Frame, FrameError, VoterEvent};
pub use models::{Identity, Role, Session};
pub use validate::ValidationError;
