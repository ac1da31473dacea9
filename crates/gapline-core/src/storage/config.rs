//! TOML-based application configuration.
//!
//! Stores:
//! - Layout paddings and floors
//! - Gap compression policy
//! - Reference timezone and tick interval of the current-item tracker
//!
//! Configuration is stored at `~/.config/gapline/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::layout::{LayoutEngine, LayoutSettings};
use crate::timeline::{CompressionPolicy, COMPRESS_FACTOR, COMPRESS_THRESHOLD_MIN};
use crate::tracker::{DEFAULT_REFERENCE_ZONE, DEFAULT_TICK_INTERVAL};

/// Layout configuration, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_top_padding")]
    pub top_padding: f64,
    #[serde(default = "default_bottom_padding")]
    pub bottom_padding: f64,
    #[serde(default = "default_min_time_height")]
    pub min_time_height: f64,
}

/// Gap compression configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionConfig {
    #[serde(default = "default_threshold_min")]
    pub threshold_min: f64,
    #[serde(default = "default_factor")]
    pub factor: f64,
}

/// Current-item tracker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// IANA zone name. An unknown name falls back to local time at runtime.
    #[serde(default = "default_reference_timezone")]
    pub reference_timezone: String,
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/gapline/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

// Default functions
fn default_top_padding() -> f64 {
    12.0
}
fn default_bottom_padding() -> f64 {
    20.0
}
fn default_min_time_height() -> f64 {
    6.0
}
fn default_threshold_min() -> f64 {
    COMPRESS_THRESHOLD_MIN
}
fn default_factor() -> f64 {
    COMPRESS_FACTOR
}
fn default_reference_timezone() -> String {
    DEFAULT_REFERENCE_ZONE.into()
}
fn default_tick_interval_secs() -> u64 {
    DEFAULT_TICK_INTERVAL.as_secs()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            top_padding: default_top_padding(),
            bottom_padding: default_bottom_padding(),
            min_time_height: default_min_time_height(),
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            threshold_min: default_threshold_min(),
            factor: default_factor(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            reference_timezone: default_reference_timezone(),
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

impl Config {
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
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(n) if n.is_u64() => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?,
                    serde_json::Value::Number(_) => value
                        .parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default config file location.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("~/.config/gapline"),
                message: e.to_string(),
            })
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };

        if !(0.0..=1.0).contains(&self.compression.factor) {
            return invalid("compression.factor", "must be between 0 and 1");
        }
        if !(self.compression.threshold_min >= 0.0) {
            return invalid("compression.threshold_min", "must not be negative");
        }
        let paddings = [
            ("layout.top_padding", self.layout.top_padding),
            ("layout.bottom_padding", self.layout.bottom_padding),
            ("layout.min_time_height", self.layout.min_time_height),
        ];
        for (key, value) in paddings {
            if !(value >= 0.0) {
                return invalid(key, "must not be negative");
            }
        }
        if self.tracker.tick_interval_secs == 0 {
            return invalid("tracker.tick_interval_secs", "must be at least 1");
        }
        if self.tracker.reference_timezone.trim().is_empty() {
            return invalid("tracker.reference_timezone", "must not be empty");
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config fails validation.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Every leaf key with its value, in dot-separated form.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    pub fn layout_settings(&self) -> LayoutSettings {
        LayoutSettings {
            top_padding: self.layout.top_padding,
            bottom_padding: self.layout.bottom_padding,
            min_time_height: self.layout.min_time_height,
        }
    }

    pub fn compression_policy(&self) -> CompressionPolicy {
        CompressionPolicy::new(self.compression.threshold_min, self.compression.factor)
    }

    pub fn layout_engine(&self) -> LayoutEngine {
        LayoutEngine::new(self.layout_settings(), self.compression_policy())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tracker.tick_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[tracker]\nreference_timezone = \"UTC\"\n").unwrap();
        assert_eq!(parsed.tracker.reference_timezone, "UTC");
        assert_eq!(parsed.tracker.tick_interval_secs, 30);
        assert_eq!(parsed.compression.threshold_min, 45.0);
        assert_eq!(parsed.layout.top_padding, 12.0);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(
            cfg.get("tracker.reference_timezone").as_deref(),
            Some("Australia/Perth")
        );
        assert_eq!(cfg.get("tracker.tick_interval_secs").as_deref(), Some("30"));
        assert_eq!(cfg.get("compression.factor").as_deref(), Some("0.35"));
        assert!(cfg.get("layout.missing_key").is_none());
        assert!(cfg.get("layout").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("compression.factor", "0.5").unwrap();
        cfg.set("tracker.tick_interval_secs", "10").unwrap();
        cfg.set("tracker.reference_timezone", "Asia/Tokyo").unwrap();
        assert_eq!(cfg.compression.factor, 0.5);
        assert_eq!(cfg.tracker.tick_interval_secs, 10);
        assert_eq!(cfg.tick_interval(), Duration::from_secs(10));
        assert_eq!(cfg.tracker.reference_timezone, "Asia/Tokyo");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("layout.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("layout", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("tracker.tick_interval_secs", "soon").is_err());
        assert!(cfg.set("compression.factor", "lots").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_rejects_out_of_range_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("compression.factor", "1.5"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("tracker.tick_interval_secs", "0").is_err());
        assert!(cfg.set("layout.top_padding", "-4").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn entries_lists_every_leaf() {
        let entries = Config::default().entries();
        assert_eq!(entries.len(), 7);
        assert!(entries
            .iter()
            .any(|(k, v)| k == "layout.bottom_padding" && v == "20.0"));
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut edited = cfg.clone();
        edited.set("layout.bottom_padding", "32").unwrap();
        edited.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().layout.bottom_padding, 32.0);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "layout = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseFailed(_))
        ));
    }

    #[test]
    fn config_builds_engine_with_default_constants() {
        let engine = Config::default().layout_engine();
        assert_eq!(engine.settings(), LayoutSettings::default());
        assert_eq!(engine.policy(), CompressionPolicy::default());
    }
}
