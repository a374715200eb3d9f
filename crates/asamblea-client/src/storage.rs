//! Durable token storage.
//!
//! Tokens are persisted to a JSON file under the fixed keys `admin_token`
//! and `voter_token` (0o600) and restored on startup to attempt session
//! resumption. Loading is tolerant: a missing or corrupt file behaves like
//! an empty store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use asamblea_core::models::Role;

/// Token persistence failure.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("token storage I/O: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization failure.
    #[error("token storage encoding: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk shape. Field names are the storage contract.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(skip_serializing_if = "Option::is_none")]
    admin_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    voter_token: Option<String>,
    /// Access code the voter token was issued for; needed to rebuild the
    /// voter channel URL on session resumption.
    #[serde(skip_serializing_if = "Option::is_none")]
    voter_code: Option<String>,
}

/// File-backed bearer-token store, one slot per role.
#[derive(Clone, Debug)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Create a store backed by the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored token for a role, if any.
    #[must_use]
    pub fn token(&self, role: Role) -> Option<String> {
        let tokens = self.load();
        match role {
            Role::Admin => tokens.admin_token,
            Role::Voter => tokens.voter_token,
        }
    }

    /// Persist a token for a role, keeping the other role's slot.
    pub fn set_token(&self, role: Role, token: &str) -> Result<(), StorageError> {
        let mut tokens = self.load();
        match role {
            Role::Admin => tokens.admin_token = Some(token.to_string()),
            Role::Voter => tokens.voter_token = Some(token.to_string()),
        }
        self.save(&tokens)
    }

    /// Stored voter access code, if any.
    #[must_use]
    pub fn voter_code(&self) -> Option<String> {
        self.load().voter_code
    }

    /// Persist the access code alongside the voter token.
    pub fn set_voter_code(&self, code: &str) -> Result<(), StorageError> {
        let mut tokens = self.load();
        tokens.voter_code = Some(code.to_string());
        self.save(&tokens)
    }

    /// Drop one role's token (and the voter code with the voter token).
    pub fn clear(&self, role: Role) -> Result<(), StorageError> {
        let mut tokens = self.load();
        match role {
            Role::Admin => tokens.admin_token = None,
            Role::Voter => {
                tokens.voter_token = None;
                tokens.voter_code = None;
            }
        }
        self.save(&tokens)
    }

    /// Delete the storage file entirely. Missing file is not an error.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn load(&self) -> StoredTokens {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return StoredTokens::default(),
            Err(e) => {
                tracing::warn!("failed to read token storage: {e}");
                return StoredTokens::default();
            }
        };
        match serde_json::from_str(&data) {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!("failed to parse token storage: {e}");
                StoredTokens::default()
            }
        }
    }

    fn save(&self, tokens: &StoredTokens) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(tokens)?;
        std::fs::write(&self.path, &json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&self.path, perms);
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
