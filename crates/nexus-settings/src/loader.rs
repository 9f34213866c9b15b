//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`DeskSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply `NEXUS_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::DeskSettings;

/// `~/.nexus`, or `/tmp/.nexus` without a home directory.
pub fn nexus_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".nexus")
}

/// Resolve the path to the settings file (`~/.nexus/settings.json`).
pub fn settings_path() -> PathBuf {
    nexus_home().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<DeskSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON or values that fail
/// validation are errors.
pub fn load_settings_from_path(path: &Path) -> Result<DeskSettings> {
    let mut settings = load_file(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn load_file(path: &Path) -> Result<DeskSettings> {
    let defaults = serde_json::to_value(DeskSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
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

/// Apply `NEXUS_*` environment variables. Invalid values are ignored with
/// a warning.
pub fn apply_env_overrides(settings: &mut DeskSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Override logic with the variable source injected, so it can be tested
/// without touching the process environment.
pub fn apply_overrides<F>(settings: &mut DeskSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(v) = read("NEXUS_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read("NEXUS_PORT") {
        match parse_u16_range(&v, 0, u16::MAX) {
            Some(port) => settings.server.port = port,
            None => warn_invalid("NEXUS_PORT", &v),
        }
    }
    if let Some(v) = read("NEXUS_DB_PATH") {
        settings.database.path = v;
    }
    if let Some(v) = read("NEXUS_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read("NEXUS_LOG_JSON") {
        match parse_bool(&v) {
            Some(json) => settings.logging.json = json,
            None => warn_invalid("NEXUS_LOG_JSON", &v),
        }
    }
    if let Some(v) = read("NEXUS_SESSION_TTL_SECS") {
        match parse_u64_range(&v, 60, 30 * 86_400) {
            Some(ttl) => settings.session.ttl_secs = ttl,
            None => warn_invalid("NEXUS_SESSION_TTL_SECS", &v),
        }
    }
    if let Some(v) = read("NEXUS_SEED_DEMO") {
        match parse_bool(&v) {
            Some(seed) => settings.seed.demo_data = seed,
            None => warn_invalid("NEXUS_SEED_DEMO", &v),
        }
    }
}

fn warn_invalid(key: &str, value: &str) {
    tracing::warn!(key, value, "invalid env var, ignoring");
}

// ── Pure parsing functions ──

/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"server": {"port": 5001, "host": "127.0.0.1"}});
        let source = serde_json::json!({"server": {"port": 9090}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 9090);
        assert_eq!(merged["server"]["host"], "127.0.0.1");
    }

    #[test]
    fn merge_null_preserves_target() {
        let merged = deep_merge(serde_json::json!({"a": 1}), serde_json::json!({"a": null}));
        assert_eq!(merged["a"], 1);
    }

    #[test]
    fn merge_array_replace() {
        let merged = deep_merge(
            serde_json::json!({"items": [1, 2, 3]}),
            serde_json::json!({"items": [4]}),
        );
        assert_eq!(merged["items"], serde_json::json!([4]));
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = load_file(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings, DeskSettings::default());
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"server": {"port": 8088}, "logging": {"modules": {"nexus_store": "debug"}}}"#,
        )
        .unwrap();

        let settings = load_file(&path).unwrap();
        assert_eq!(settings.server.port, 8088);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.logging.modules["nexus_store"], "debug");
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();
        assert!(matches!(load_file(&path), Err(SettingsError::Json(_))));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"session": {"ttlSecs": 0}}"#).unwrap();
        assert!(matches!(
            load_settings_from_path(&path),
            Err(SettingsError::InvalidValue(_))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut settings = DeskSettings::default();
        apply_overrides(
            &mut settings,
            env(&[
                ("NEXUS_HOST", "0.0.0.0"),
                ("NEXUS_PORT", "8080"),
                ("NEXUS_DB_PATH", "/data/desk.db"),
                ("NEXUS_LOG_LEVEL", "debug"),
                ("NEXUS_LOG_JSON", "off"),
                ("NEXUS_SESSION_TTL_SECS", "3600"),
                ("NEXUS_SEED_DEMO", "no"),
            ]),
        );
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.database.path, "/data/desk.db");
        assert_eq!(settings.logging.level, "debug");
        assert!(!settings.logging.json);
        assert_eq!(settings.session.ttl_secs, 3600);
        assert!(!settings.seed.demo_data);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut settings = DeskSettings::default();
        apply_overrides(
            &mut settings,
            env(&[
                ("NEXUS_PORT", "99999"),
                ("NEXUS_LOG_JSON", "maybe"),
                ("NEXUS_SESSION_TTL_SECS", "5"),
                ("NEXUS_HOST", ""),
            ]),
        );
        assert_eq!(settings, DeskSettings::default());
    }

    #[test]
    fn parse_helpers() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("nah"), None);
        assert_eq!(parse_u16_range("0", 0, 10), Some(0));
        assert_eq!(parse_u16_range("11", 0, 10), None);
        assert_eq!(parse_u64_range("-1", 0, 10), None);
    }
}
