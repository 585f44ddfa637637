//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Scoring parameters (water unit size, caps, bonus points)
//! - Activity defaults (step goal, list limits)
//!
//! Configuration is stored at `~/.config/pacepoint/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::rewards::RewardsConfig;

/// Activity-layer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Daily step target used when the user has not set one
    #[serde(default = "default_step_goal")]
    pub default_step_goal: u64,
    /// Default page size for reward history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Default page size for workout listings
    #[serde(default = "default_workout_list_limit")]
    pub workout_list_limit: usize,
}

// Default functions
fn default_step_goal() -> u64 {
    8000
}
fn default_history_limit() -> usize {
    50
}
fn default_workout_list_limit() -> usize {
    20
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            default_step_goal: default_step_goal(),
            history_limit: default_history_limit(),
            workout_list_limit: default_workout_list_limit(),
        }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pacepoint/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
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
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: e.to_string(),
                        })?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| ConfigError::InvalidValue {
                                    key: key.to_string(),
                                    message: format!("cannot parse '{value}' as number"),
                                })?
                        } else {
                            return Err(ConfigError::InvalidValue {
                                key: key.to_string(),
                                message: format!("cannot parse '{value}' as number"),
                            });
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: e.to_string(),
                        })?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(ConfigError::DirUnavailable)?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path,
                        message: e.to_string(),
                    })?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
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

    /// Set a config value by key. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.save()?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::BackdatedPolicy;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.rewards.water_ml_per_point, 250);
        assert_eq!(parsed.activity.default_step_goal, 8000);
    }

    #[test]
    fn partial_toml_fills_missing_fields() {
        let cfg: Config = toml::from_str(
            "[rewards]\nsteps_goal_points = 75\n",
        )
        .unwrap();
        assert_eq!(cfg.rewards.steps_goal_points, 75);
        assert_eq!(cfg.rewards.water_daily_cap, 16);
        assert_eq!(cfg.activity.history_limit, 50);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("rewards.water_ml_per_point").as_deref(), Some("250"));
        assert_eq!(cfg.get("activity.default_step_goal").as_deref(), Some("8000"));
        assert_eq!(cfg.get("rewards.backdated").as_deref(), Some("ignore"));
        assert!(cfg.get("rewards.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "rewards.steps_goal_points", "75").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "rewards.steps_goal_points").unwrap(),
            &serde_json::Value::Number(75.into())
        );
    }

    #[test]
    fn set_json_value_by_path_updates_enum_string() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "rewards.backdated", "reset").unwrap();
        let cfg: Config = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.rewards.backdated, BackdatedPolicy::Reset);
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "rewards.nonexistent_key", "1");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result =
            Config::set_json_value_by_path(&mut json, "rewards.water_daily_cap", "plenty");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.rewards.water_ml_per_point, 250);
        assert_eq!(cfg.rewards.water_daily_cap, 16);
        assert_eq!(cfg.rewards.hydration_threshold_ml, 2000);
        assert_eq!(cfg.rewards.steps_goal_points, 50);
        assert_eq!(cfg.rewards.workout_base_points, 20);
        assert_eq!(cfg.rewards.backdated, BackdatedPolicy::Ignore);
        assert_eq!(cfg.activity.default_step_goal, 8000);
        assert_eq!(cfg.activity.history_limit, 50);
        assert_eq!(cfg.activity.workout_list_limit, 20);
    }
}
