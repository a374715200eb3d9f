//! Session-boundary error type.

use thiserror::Error;

use asamblea_client::config::ConfigError;
use asamblea_client::storage::StorageError;
use asamblea_client::ApiError;
use asamblea_core::ValidationError;

/// Failure at the session controller boundary.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Input rejected before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// REST call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Configuration problem (bad API root, unreadable file).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Token persistence failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An operation required a session that does not exist.
    #[error("no hay sesión activa")]
    NotAuthenticated,

    /// An operation required the other role.
    #[error("la sesión activa no es de {0}")]
    WrongRole(&'static str),
}
