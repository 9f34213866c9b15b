use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings document, `~/.nexus/settings.json`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeskSettings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub session: SessionSettings,
    pub seed: SeedSettings,
}

/// HTTP listener settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port. `0` picks a free port.
    pub port: u16,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// SQLite file. Relative paths resolve under `~/.nexus`.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "feedback.db".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level (`trace`..`error`). `RUST_LOG` takes precedence.
    pub level: String,
    /// Per-module overrides, e.g. `{"nexus_store": "debug"}`.
    pub modules: BTreeMap<String, String>,
    /// JSON lines when true, human-readable otherwise.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            modules: BTreeMap::new(),
            json: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Bearer token lifetime in seconds.
    pub ttl_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { ttl_secs: 86_400 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedSettings {
    /// Seed demo users and tickets into an empty database at startup.
    pub demo_data: bool,
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self { demo_data: true }
    }
}

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl DeskSettings {
    /// Resolve the database path: absolute paths as given, relative paths
    /// under `home`. `:memory:` is passed through.
    pub fn database_path(&self, home: &Path) -> PathBuf {
        let raw = Path::new(&self.database.path);
        if raw.is_absolute() || self.database.path == ":memory:" {
            raw.to_path_buf()
        } else {
            home.join(raw)
        }
    }

    /// Reject values that would only fail later at startup.
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(SettingsError::InvalidValue("server.host is empty".into()));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "server.requestTimeoutSecs must be positive".into(),
            ));
        }
        if self.session.ttl_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "session.ttlSecs must be positive".into(),
            ));
        }
        if self.database.path.trim().is_empty() {
            return Err(SettingsError::InvalidValue("database.path is empty".into()));
        }
        let levels = std::iter::once(&self.logging.level).chain(self.logging.modules.values());
        for level in levels {
            if !LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(SettingsError::InvalidValue(format!(
                    "unknown log level: {level}"
                )));
            }
        }
        Ok(())
    }
}
