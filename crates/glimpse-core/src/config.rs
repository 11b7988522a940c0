//! TOML-based application configuration.
//!
//! Stores service tuning:
//! - Rotation cadence and recency window
//! - Jitter amplitude and optional seed
//! - Fallback cache refresh interval
//! - Registry persistence interval
//!
//! Configuration is stored at `~/.config/glimpse/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::rotation::Jitter;

/// Rotation engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Seconds between rotation cycles.
    #[serde(default = "default_rotation_interval")]
    pub interval_secs: u64,
    /// Window within which a re-shown presentation is penalized.
    #[serde(default = "default_recency_window")]
    pub recency_window_secs: u64,
    /// Jitter amplitude added to every score.
    #[serde(default = "default_jitter_amplitude")]
    pub jitter_amplitude: f64,
    /// Fixed jitter seed for reproducible runs (entropy-seeded when unset).
    #[serde(default)]
    pub jitter_seed: Option<u64>,
}

impl RotationConfig {
    /// Build the jitter source this configuration describes.
    pub fn jitter(&self) -> Jitter {
        match self.jitter_seed {
            Some(seed) => Jitter::seeded(self.jitter_amplitude, seed),
            None => Jitter::new(self.jitter_amplitude),
        }
    }
}

/// Fallback cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds between refreshes from the context source.
    #[serde(default = "default_cache_refresh")]
    pub refresh_interval_secs: u64,
    /// How many recent messages to keep in the snapshot.
    #[serde(default = "default_recent_email_limit")]
    pub recent_email_limit: usize,
}

/// Session registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Seconds between registry snapshots while serving.
    #[serde(default = "default_persist_interval")]
    pub persist_interval_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/glimpse/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

// Default functions
fn default_rotation_interval() -> u64 {
    60
}
fn default_recency_window() -> u64 {
    90
}
fn default_jitter_amplitude() -> f64 {
    5.0
}
fn default_cache_refresh() -> u64 {
    300
}
fn default_recent_email_limit() -> usize {
    3
}
fn default_persist_interval() -> u64 {
    300
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_rotation_interval(),
            recency_window_secs: default_recency_window(),
            jitter_amplitude: default_jitter_amplitude(),
            jitter_seed: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_cache_refresh(),
            recent_email_limit: default_recent_email_limit(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            persist_interval_secs: default_persist_interval(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rotation: RotationConfig::default(),
            cache: CacheConfig::default(),
            registry: RegistryConfig::default(),
        }
    }
}

/// Returns `~/.config/glimpse[-dev]/` based on GLIMPSE_ENV.
///
/// Set GLIMPSE_ENV=dev to use the development data directory.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("GLIMPSE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("glimpse-dev")
    } else {
        base_dir.join("glimpse")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// Default location of the registry snapshot.
pub fn sessions_path() -> Result<PathBuf, ConfigError> {
    Ok(data_dir()?.join("sessions.json"))
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
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

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
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) | serde_json::Value::Null => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
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
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
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

    /// Set a config value by key and persist. Returns an error if the key
    /// is unknown or the value does not parse.
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
