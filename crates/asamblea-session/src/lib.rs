//! Session layer of the assembly voting client.
//!
//! The [`SessionController`] is the only mutation boundary: it owns the
//! session, both channel supervisors, the countdown registry, and the
//! refresh scheduler. Every other component reaches state through it, never
//! through shared globals.
//!
//! - [`controller`]: Login/logout lifecycle, voter and admin operations
//! - [`notify`]: Severity-coded notification surface and the admin activity
//!   log
//! - [`confirm`]: Async confirmation prompts with default-deny timeout
//! - [`frontend`]: Data-out trait the UI implements; absorbs late
//!   deliveries after navigation

pub mod confirm;
pub mod controller;
pub mod frontend;
pub mod notify;

mod error;
mod hooks;
mod refresher;

pub use confirm::{ConfirmDecision, ConfirmGate, ConfirmTicket};
pub use controller::SessionController;
pub use error::SessionError;
pub use frontend::Frontend;
pub use notify::{ActivityEntry, ActivityLog, Notice, Notifier, Severity};
