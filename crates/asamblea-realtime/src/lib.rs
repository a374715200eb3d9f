//! Real-time layer: push channel, reconnection, routing, countdowns.
//!
//! - [`channel`]: One websocket connection; turns transport messages into
//!   text frames, drops everything else
//! - [`supervisor`]: Per-role connection lifecycle with exponential-backoff
//!   reconnection and a hard attempt ceiling
//! - [`router`]: Frame → typed event dispatch with unknown-kind tolerance,
//!   handler error containment, and `question_expired` deduplication
//! - [`countdown`]: Shared-tick countdown registry that stops its clock
//!   when idle
//! - [`tasks`]: Named periodic refresh tasks, stopped on screen exit so no
//!   interval leaks across navigations
//!
//! Everything here treats timers as presentation-only: the backend is the
//! authority and full refreshes re-sync local state.

pub mod channel;
pub mod countdown;
pub mod router;
pub mod supervisor;
pub mod tasks;

pub use channel::{Channel, ChannelError};
pub use countdown::CountdownRegistry;
pub use router::{AdminHandler, AdminRouter, FrameSink, HandlerError, VoterHandler, VoterRouter};
pub use supervisor::ChannelSupervisor;
pub use tasks::RefreshScheduler;
