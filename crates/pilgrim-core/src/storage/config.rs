//! TOML-based application configuration.
//!
//! Stores:
//! - Phase durations for both modes
//! - The mode a fresh journey starts in
//! - An optional custom unlock catalog
//! - Clock period
//!
//! Configuration is stored at `<data dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::progression::{UnlockCatalog, UnlockItem};
use crate::timer::{DurationTable, DurationTables, Mode};

/// Phase durations (seconds) for one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationsConfig {
    pub work: u64,
    pub short_rest: u64,
    pub long_rest: u64,
}

impl From<DurationsConfig> for DurationTable {
    fn from(c: DurationsConfig) -> Self {
        DurationTable {
            work: c.work,
            short_rest: c.short_rest,
            long_rest: c.long_rest,
        }
    }
}

impl From<DurationTable> for DurationsConfig {
    fn from(t: DurationTable) -> Self {
        DurationsConfig {
            work: t.work,
            short_rest: t.short_rest,
            long_rest: t.long_rest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationSets {
    #[serde(default = "default_standard")]
    pub standard: DurationsConfig,
    #[serde(default = "default_accelerated")]
    pub accelerated: DurationsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Milliseconds between ticks.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub default_mode: Mode,
    #[serde(default)]
    pub durations: DurationSets,
    #[serde(default)]
    pub clock: ClockConfig,
    /// Custom unlock catalog; the built-in journey when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Vec<UnlockItem>>,
}

fn default_standard() -> DurationsConfig {
    DurationTable::standard().into()
}
fn default_accelerated() -> DurationsConfig {
    DurationTable::accelerated().into()
}
fn default_tick_ms() -> u64 {
    1000
}

impl Default for DurationSets {
    fn default() -> Self {
        Self {
            standard: default_standard(),
            accelerated: default_accelerated(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            durations: DurationSets::default(),
            default_mode: Mode::Standard,
            clock: ClockConfig::default(),
            catalog: None,
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
        let unknown = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".into(),
        };
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
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
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?;
                        serde_json::Value::Number(n.into())
                    }
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

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// fails validation, or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
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

    /// Set a config value by key, validate, and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// the result fails validation, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Every duration must be positive and the catalog must be well-formed.
    pub fn validate(&self) -> Result<()> {
        for (name, table) in [
            ("standard", self.durations.standard),
            ("accelerated", self.durations.accelerated),
        ] {
            if let Some(phase) = DurationTable::from(table).zero_phase() {
                return Err(ConfigError::InvalidValue {
                    key: format!("durations.{name}.{phase}"),
                    message: "duration must be greater than zero".into(),
                }
                .into());
            }
        }
        if self.clock.tick_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "clock.tick_ms".into(),
                message: "tick period must be greater than zero".into(),
            }
            .into());
        }
        self.catalog()?;
        Ok(())
    }

    pub fn duration_tables(&self) -> DurationTables {
        DurationTables {
            standard: self.durations.standard.into(),
            accelerated: self.durations.accelerated.into(),
        }
    }

    pub fn catalog(&self) -> Result<UnlockCatalog> {
        match &self.catalog {
            Some(items) => UnlockCatalog::new(items.clone()).map_err(CoreError::from),
            None => Ok(UnlockCatalog::journey()),
        }
    }

    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.clock.tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::Category;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.durations.standard.work, 1500);
        assert_eq!(parsed.durations.accelerated.long_rest, 8);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            default_mode = "accelerated"

            [durations.standard]
            work = 3000
            short_rest = 600
            long_rest = 1200
            "#,
        )
        .unwrap();
        assert_eq!(parsed.default_mode, Mode::Accelerated);
        assert_eq!(parsed.duration_tables().standard.work, 3000);
        assert_eq!(parsed.duration_tables().accelerated, DurationTable::accelerated());
        assert_eq!(parsed.clock.tick_ms, 1000);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("durations.standard.work").as_deref(), Some("1500"));
        assert_eq!(cfg.get("default_mode").as_deref(), Some("standard"));
        assert!(cfg.get("durations.missing").is_none());
    }

    #[test]
    fn apply_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.apply("durations.accelerated.work", "7").unwrap();
        assert_eq!(cfg.durations.accelerated.work, 7);
    }

    #[test]
    fn apply_updates_mode() {
        let mut cfg = Config::default();
        cfg.apply("default_mode", "accelerated").unwrap();
        assert_eq!(cfg.default_mode, Mode::Accelerated);
        assert!(cfg.apply("default_mode", "warp").is_err());
        assert_eq!(cfg.default_mode, Mode::Accelerated);
    }

    #[test]
    fn apply_rejects_zero_duration() {
        let mut cfg = Config::default();
        let err = cfg.apply("durations.standard.short_rest", "0").unwrap_err();
        assert!(err.to_string().contains("durations.standard.short_rest"));
        assert_eq!(cfg.durations.standard.short_rest, 300);
    }

    #[test]
    fn apply_rejects_unknown_key_and_bad_number() {
        let mut cfg = Config::default();
        assert!(cfg.apply("durations.standard.nap", "5").is_err());
        assert!(cfg.apply("clock.tick_ms", "fast").is_err());
        assert!(cfg.apply("", "5").is_err());
    }

    #[test]
    fn custom_catalog_is_validated() {
        let mut cfg = Config::default();
        cfg.catalog = Some(vec![
            UnlockItem::new("meadow", Category::Environment, 0, "Meadow", ""),
            UnlockItem::new("pup", Category::Avatar, 0, "Pup", ""),
            UnlockItem::new("wolf", Category::Avatar, 2, "Wolf", ""),
        ]);
        let catalog = cfg.catalog().unwrap();
        assert_eq!(catalog.items().len(), 3);

        cfg.catalog = Some(vec![UnlockItem::new("pup", Category::Avatar, 0, "Pup", "")]);
        assert!(cfg.validate().is_err());
    }
}
