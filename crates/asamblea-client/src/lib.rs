//! REST surface of the assembly voting client.
//!
//! - [`config`]: Layered configuration (compiled defaults, JSON file,
//!   `ASAMBLEA_*` env overrides)
//! - [`storage`]: Durable bearer-token store under the fixed keys
//!   `admin_token` / `voter_token`
//! - [`error`]: [`ApiError`] with the backend's `detail` convention
//! - [`api`]: The [`ApiClient`] wrapping every backend endpoint
//!
//! No retry logic lives here: REST failures surface to the user, who
//! retries through the UI. Only the push channel auto-reconnects.

pub mod api;
pub mod config;
pub mod error;
pub mod storage;

pub use api::{ApiClient, Download};
pub use config::ClientConfig;
pub use error::ApiError;
pub use storage::TokenStore;
