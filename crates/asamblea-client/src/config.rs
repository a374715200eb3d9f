//! Client configuration with layered sources.
//!
//! Loading flow:
//! 1. Compiled [`ClientConfig::default()`]
//! 2. `~/.asamblea/config.json`, deep-merged over defaults
//! 3. `ASAMBLEA_*` environment variables (highest priority)
//!
//! Deep merge rules: objects merge recursively, arrays and primitives are
//! replaced, null source values are skipped.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use asamblea_core::constants::{DEFAULT_CONJUNTO, DEFAULT_DEMO_CODE};
use asamblea_core::models::Role;

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("no se pudo leer la configuración: {0}")]
    Io(#[from] std::io::Error),
    /// The config file or merged result is not valid.
    #[error("configuración inválida: {0}")]
    Json(#[from] serde_json::Error),
    /// `api_root` is not an absolute URL.
    #[error("api_root debe ser una URL absoluta: {0}")]
    BadApiRoot(#[from] url::ParseError),
}

/// Client configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ClientConfig {
    /// Absolute API root, e.g. `https://asamblea.example.com/api`.
    pub api_root: String,
    /// Organization name used for report filenames until the backend
    /// provides one.
    pub conjunto: String,
    /// Reserved demo access code. Never opens a channel or touches backend
    /// state.
    pub demo_code: String,
    /// Token storage file.
    pub storage_path: PathBuf,
    /// Admin aforo polling period, seconds.
    pub aforo_poll_secs: u64,
    /// Voter question polling period, seconds.
    pub questions_poll_secs: u64,
    /// Default log level when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_root: "http://127.0.0.1:8000".into(),
            conjunto: DEFAULT_CONJUNTO.into(),
            demo_code: DEFAULT_DEMO_CODE.into(),
            storage_path: data_dir().join("tokens.json"),
            aforo_poll_secs: 10,
            questions_poll_secs: 15,
            log_level: "info".into(),
        }
    }
}

/// Resolve `~/.asamblea`.
fn data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".asamblea")
}

/// Resolve the path to the config file (`~/.asamblea/config.json`).
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

impl ClientConfig {
    /// Load from the default path with env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&config_path())
    }

    /// Load from a specific path with env overrides.
    ///
    /// A missing file yields defaults; invalid JSON is an error.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let defaults = serde_json::to_value(Self::default())?;

        let merged = if path.exists() {
            debug!(?path, "loading config from file");
            let content = std::fs::read_to_string(path)?;
            let user: Value = serde_json::from_str(&content)?;
            deep_merge(defaults, user)
        } else {
            debug!(?path, "config file not found, using defaults");
            defaults
        };

        let mut config: Self = serde_json::from_value(merged)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = read_env_string("ASAMBLEA_API_ROOT") {
            self.api_root = v;
        }
        if let Some(v) = read_env_string("ASAMBLEA_CONJUNTO") {
            self.conjunto = v;
        }
        if let Some(v) = read_env_string("ASAMBLEA_DEMO_CODE") {
            self.demo_code = v;
        }
        if let Some(v) = read_env_string("ASAMBLEA_STORAGE_PATH") {
            self.storage_path = PathBuf::from(v);
        }
        if let Some(v) = read_env_u64("ASAMBLEA_AFORO_POLL_SECS", 1, 3600) {
            self.aforo_poll_secs = v;
        }
        if let Some(v) = read_env_u64("ASAMBLEA_QUESTIONS_POLL_SECS", 1, 3600) {
            self.questions_poll_secs = v;
        }
        if let Some(v) = read_env_string("ASAMBLEA_LOG_LEVEL") {
            self.log_level = v;
        }
    }

    /// Parsed API root.
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        Ok(Url::parse(&self.api_root)?)
    }

    /// Push-channel endpoint for a role. The scheme mirrors the API root:
    /// `wss` iff the API is served over `https`.
    pub fn ws_endpoint(&self, role: Role, code: &str) -> Result<String, ConfigError> {
        let api = self.api_url()?;
        let scheme = if api.scheme() == "https" { "wss" } else { "ws" };
        let host = api.host_str().unwrap_or("127.0.0.1");
        let port = api
            .port()
            .map(|p| format!(":{p}"))
            .unwrap_or_default();
        let path = match role {
            Role::Admin => "/ws/admin".to_string(),
            Role::Voter => format!("/ws/voter/{code}"),
        };
        Ok(format!("{scheme}://{host}{port}{path}"))
    }
}

/// Recursive deep merge of two JSON values.
fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    std::env::var(name)
        .ok()?
        .parse::<u64>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ClientConfig::default();
        assert_eq!(config.demo_code, "0-000");
        assert_eq!(config.aforo_poll_secs, 10);
        assert_eq!(config.questions_poll_secs, 15);
        assert!(config.api_url().is_ok());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = ClientConfig::load_from_path(Path::new("/no/such/config.json")).unwrap();
        assert_eq!(config, {
            let mut expected = ClientConfig::default();
            expected.apply_env_overrides();
            expected
        });
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"api_root": "https://votos.example.com/api", "aforo_poll_secs": 5}"#,
        )
        .unwrap();

        let config = ClientConfig::load_from_path(&path).unwrap();
        assert_eq!(config.api_root, "https://votos.example.com/api");
        assert_eq!(config.aforo_poll_secs, 5);
        // Untouched keys keep defaults
        assert_eq!(config.demo_code, "0-000");
    }

    #[test]
    fn invalid_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{broken").unwrap();
        assert!(ClientConfig::load_from_path(&path).is_err());
    }

    #[test]
    fn ws_endpoint_mirrors_scheme() {
        let config = ClientConfig {
            api_root: "https://votos.example.com/api".into(),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.ws_endpoint(Role::Admin, "").unwrap(),
            "wss://votos.example.com/ws/admin"
        );
        assert_eq!(
            config.ws_endpoint(Role::Voter, "1-201").unwrap(),
            "wss://votos.example.com/ws/voter/1-201"
        );
    }

    #[test]
    fn ws_endpoint_plain_http_keeps_port() {
        let config = ClientConfig {
            api_root: "http://127.0.0.1:8000".into(),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.ws_endpoint(Role::Voter, "2-101").unwrap(),
            "ws://127.0.0.1:8000/ws/voter/2-101"
        );
    }

    #[test]
    fn relative_api_root_is_error() {
        let config = ClientConfig {
            api_root: "/api".into(),
            ..ClientConfig::default()
        };
        assert!(config.ws_endpoint(Role::Admin, "").is_err());
    }
}
