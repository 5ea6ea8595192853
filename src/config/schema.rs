/// Configuration schema and defaults for codeagent.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[server]`, `[backend]`, `[health]`, `[storage]`, and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default backend base URL, shared with the settings store.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Default workspace identifier.
pub const DEFAULT_WORKSPACE_ID: &str = "default";

/// Default dashboard listen address.
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8765";

/// Default interval between backend health checks.
pub const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level codeagent configuration.
///
/// Maps directly to `~/.codeagent/config.toml` and `.codeagent.toml`.
/// Missing sections and fields fall back to built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub health: HealthConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Local dashboard server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for `codeagent serve`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
    /// Print one access-log line per request.
    pub access_log: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_SERVER_ADDR.to_string(),
            open_browser: true,
            access_log: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Fallback values used when the settings store has no saved value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend base URL used until the user saves one.
    pub default_url: String,
    /// Workspace id used until the user saves one.
    pub default_workspace: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            default_url: DEFAULT_BACKEND_URL.to_string(),
            default_workspace: DEFAULT_WORKSPACE_ID.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [health]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Seconds between backend health checks while the dashboard runs.
    pub interval_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_HEALTH_INTERVAL_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// [storage]
// ---------------------------------------------------------------------------

/// Location of the persistent key-value store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Explicit store file. Empty means `~/.codeagent/local-storage.json`.
    pub path: String,
}

impl StorageConfig {
    /// Resolve the store file path, if one can be determined.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if self.path.trim().is_empty() {
            dirs::home_dir().map(|home| home.join(".codeagent").join("local-storage.json"))
        } else {
            Some(PathBuf::from(&self.path))
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append one JSON line per user action to `~/.codeagent/activity.jsonl`.
    pub activity_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { activity_log: true }
    }
}

// ---------------------------------------------------------------------------
// Default annotated TOML
// ---------------------------------------------------------------------------

impl ClientConfig {
    /// The annotated config file written by `codeagent config init`.
    pub fn default_toml() -> String {
        r#"# codeagent configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (CODEAGENT_*)
#   2. Project config (.codeagent.toml in current directory)
#   3. User global config (~/.codeagent/config.toml)
#   4. Built-in defaults

[server]
addr = "127.0.0.1:8765"
open_browser = true
access_log = true

[backend]
# Used until a backend URL / workspace is saved from the Settings page.
default_url = "http://localhost:8000"
default_workspace = "default"

[health]
interval_secs = 10

[storage]
path = ""             # empty = ~/.codeagent/local-storage.json

[logging]
activity_log = true   # ~/.codeagent/activity.jsonl
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses_back() {
        let toml_str = ClientConfig::default_toml();
        let config: ClientConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.server.addr, DEFAULT_SERVER_ADDR);
        assert_eq!(config.backend.default_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.health.interval_secs, 10);
        assert!(config.logging.activity_log);
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.backend.default_workspace, "default");
        assert!(config.server.open_browser);
        assert!(config.storage.path.is_empty());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
[server]
addr = "0.0.0.0:9000"
"#,
        )
        .unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:9000");
        assert!(config.server.access_log);
        assert_eq!(config.health.interval_secs, 10);
    }

    #[test]
    fn explicit_storage_path_is_used() {
        let storage = StorageConfig {
            path: "/tmp/store.json".to_string(),
        };
        assert_eq!(
            storage.resolved_path(),
            Some(PathBuf::from("/tmp/store.json"))
        );
    }
}
