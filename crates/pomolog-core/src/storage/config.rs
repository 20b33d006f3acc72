//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default duration and preset durations for the timer
//! - Host polling interval
//! - Display locale and time zone offset
//! - Persistence backend
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::format::{Locale, Zone};

/// Timer-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_minutes")]
    pub default_minutes: f64,
    #[serde(default = "default_presets")]
    pub presets: Vec<u32>,
    /// How often a host re-queries remaining time while running.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Display configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    #[serde(default)]
    pub locale: Locale,
    /// Fixed offset east of UTC; absent means the system local zone.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    File,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

// Default functions
fn default_minutes() -> f64 {
    25.0
}
fn default_presets() -> Vec<u32> {
    (1..=12).map(|i| i * 5).collect()
}
fn default_poll_interval_ms() -> u64 {
    250
}

const MAX_POLL_INTERVAL_MS: u64 = 1000;

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_minutes(),
            presets: default_presets(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl TimerConfig {
    /// Minutes for the 1-based preset `index`, as listed by `timer presets`.
    pub fn preset_minutes(&self, index: usize) -> Option<f64> {
        let slot = index.checked_sub(1)?;
        self.presets.get(slot).map(|&m| f64::from(m))
    }
}

impl Config {
    fn collect_leaf_keys(value: &serde_json::Value, prefix: &str, out: &mut Vec<String>) {
        match value {
            serde_json::Value::Object(map) => {
                for (name, child) in map {
                    let path = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{prefix}.{name}")
                    };
                    Self::collect_leaf_keys(child, &path, out);
                }
            }
            _ => out.push(prefix.to_string()),
        }
    }

    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                // Optional fields serialize as null; accept them as settable.
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) | serde_json::Value::Null
                        if value.parse::<f64>().is_ok() =>
                    {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            let n = value.parse::<f64>().map_err(|e| invalid(e.to_string()))?;
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        }
                    }
                    serde_json::Value::Number(_) => {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                    serde_json::Value::Null if value == "none" => serde_json::Value::Null,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::load_from(&Self::path()?)?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let minutes = self.timer.default_minutes;
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "timer.default_minutes".into(),
                message: format!("{minutes} is not a positive duration"),
            });
        }
        if self.timer.poll_interval_ms == 0 || self.timer.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::InvalidValue {
                key: "timer.poll_interval_ms".into(),
                message: format!("must be between 1 and {MAX_POLL_INTERVAL_MS}"),
            });
        }
        if self.timer.presets.is_empty() || self.timer.presets.contains(&0) {
            return Err(ConfigError::InvalidValue {
                key: "timer.presets".into(),
                message: "expected a non-empty list of positive minutes".into(),
            });
        }
        Ok(())
    }

    /// Every settable dot-path key, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            Self::collect_leaf_keys(&json, "", &mut keys);
        }
        keys.sort();
        keys
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// into the field's type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn zone(&self) -> Zone {
        Zone::from_offset_minutes(self.display.utc_offset_minutes)
    }

    pub fn locale(&self) -> Locale {
        self.display.locale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.timer.default_minutes, 25.0);
        assert_eq!(parsed.timer.presets.first(), Some(&5));
        assert_eq!(parsed.timer.presets.last(), Some(&60));
        assert_eq!(parsed.display.locale, Locale::En);
        assert_eq!(parsed.storage.backend, StorageBackend::Sqlite);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[display]\nlocale = \"zh\"\n").unwrap();
        assert_eq!(cfg.display.locale, Locale::Zh);
        assert_eq!(cfg.timer.poll_interval_ms, 250);
        assert_eq!(cfg.zone(), Zone::Local);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.poll_interval_ms").as_deref(), Some("250"));
        assert_eq!(cfg.get("display.locale").as_deref(), Some("en"));
        assert_eq!(cfg.get("storage.backend").as_deref(), Some("sqlite"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn apply_updates_number_string_and_optional() {
        let mut cfg = Config::default();
        cfg.apply("timer.default_minutes", "50").unwrap();
        assert_eq!(cfg.timer.default_minutes, 50.0);
        cfg.apply("timer.default_minutes", "0.5").unwrap();
        assert_eq!(cfg.timer.default_minutes, 0.5);
        cfg.apply("display.locale", "zh").unwrap();
        assert_eq!(cfg.locale(), Locale::Zh);
        cfg.apply("display.utc_offset_minutes", "480").unwrap();
        assert_eq!(cfg.zone(), Zone::Fixed(480));
        cfg.apply("display.utc_offset_minutes", "none").unwrap();
        assert_eq!(cfg.zone(), Zone::Local);
        cfg.apply("timer.presets", "[10, 20]").unwrap();
        assert_eq!(cfg.timer.presets, vec![10, 20]);
    }

    #[test]
    fn apply_rejects_unknown_key_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("timer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.apply("", "1"), Err(ConfigError::UnknownKey(_))));
        assert!(cfg.apply("timer.poll_interval_ms", "fast").is_err());
        assert!(cfg.apply("timer.poll_interval_ms", "5000").is_err());
        assert!(cfg.apply("timer.default_minutes", "-3").is_err());
        assert!(cfg.apply("display.locale", "fr").is_err());
        // Failed applies leave the config untouched.
        assert_eq!(cfg.timer.poll_interval_ms, 250);
        assert_eq!(cfg.timer.default_minutes, 25.0);
    }

    #[test]
    fn presets_are_one_based_and_validated() {
        let mut cfg = Config::default();
        assert_eq!(cfg.timer.preset_minutes(1), Some(5.0));
        assert_eq!(cfg.timer.preset_minutes(12), Some(60.0));
        assert_eq!(cfg.timer.preset_minutes(0), None);
        assert_eq!(cfg.timer.preset_minutes(13), None);

        assert!(cfg.apply("timer.presets", "[]").is_err());
        assert!(cfg.apply("timer.presets", "[10, 0]").is_err());
        assert_eq!(cfg.timer.presets.len(), 12);
    }

    #[test]
    fn keys_lists_every_leaf() {
        let keys = Config::default().keys();
        assert_eq!(
            keys,
            [
                "display.locale",
                "display.utc_offset_minutes",
                "storage.backend",
                "timer.default_minutes",
                "timer.poll_interval_ms",
                "timer.presets",
            ]
        );
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.timer.default_minutes, 25.0);
        assert!(path.exists());
    }

    #[test]
    fn load_from_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "timer = [[[").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
