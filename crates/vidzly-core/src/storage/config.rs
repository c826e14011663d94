//! TOML-based application configuration.
//!
//! Holds the tunables of the engagement engine:
//! - Notification log capacity and platform alert spacing
//! - Per-kind notification cooldowns
//! - Streak day boundary and break window
//! - Curated feed history size and staleness
//! - Text generator endpoint
//!
//! Configuration is stored at `<data_dir>/config.toml`. User-facing
//! notification switches are not configuration; they live in the store.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::notifications::ScheduledKind;

/// Notification center configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    /// Added on top of a kind's in-app cooldown to get its platform alert cooldown.
    #[serde(default = "default_platform_min_interval_hours")]
    pub platform_min_interval_hours: u32,
}

/// Per-kind cooldown windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownConfig {
    #[serde(default = "default_daily_highlight_hours")]
    pub daily_highlight_hours: u32,
    #[serde(default = "default_weekly_roundup_hours")]
    pub weekly_roundup_hours: u32,
    #[serde(default = "default_humorous_surprise_hours")]
    pub humorous_surprise_hours: u32,
    #[serde(default = "default_inactivity_threshold_days")]
    pub inactivity_threshold_days: u32,
    #[serde(default = "default_inactivity_rearm_hours")]
    pub inactivity_rearm_hours: u32,
}

/// Daily streak configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Offset from UTC used to decide where a calendar day starts.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_break_after_hours")]
    pub break_after_hours: u32,
}

/// Curated feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationConfig {
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_stale_hours")]
    pub stale_hours: u32,
    #[serde(default = "default_feed_size")]
    pub feed_size: usize,
}

/// Text generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub cooldowns: CooldownConfig,
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub curation: CurationConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

// Default functions
fn default_log_capacity() -> usize {
    30
}
fn default_platform_min_interval_hours() -> u32 {
    20
}
fn default_daily_highlight_hours() -> u32 {
    23
}
fn default_weekly_roundup_hours() -> u32 {
    156
}
fn default_humorous_surprise_hours() -> u32 {
    48
}
fn default_inactivity_threshold_days() -> u32 {
    3
}
fn default_inactivity_rearm_hours() -> u32 {
    65
}
fn default_break_after_hours() -> u32 {
    48
}
fn default_history_capacity() -> usize {
    5
}
fn default_stale_hours() -> u32 {
    12
}
fn default_feed_size() -> usize {
    5
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            log_capacity: default_log_capacity(),
            platform_min_interval_hours: default_platform_min_interval_hours(),
        }
    }
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            daily_highlight_hours: default_daily_highlight_hours(),
            weekly_roundup_hours: default_weekly_roundup_hours(),
            humorous_surprise_hours: default_humorous_surprise_hours(),
            inactivity_threshold_days: default_inactivity_threshold_days(),
            inactivity_rearm_hours: default_inactivity_rearm_hours(),
        }
    }
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            break_after_hours: default_break_after_hours(),
        }
    }
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            stale_hours: default_stale_hours(),
            feed_size: default_feed_size(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl CooldownConfig {
    /// In-app cooldown for a scheduled kind.
    pub fn cooldown(&self, kind: ScheduledKind) -> Duration {
        match kind {
            ScheduledKind::DailyHighlight => Duration::hours(self.daily_highlight_hours.into()),
            ScheduledKind::WeeklyRoundup => Duration::hours(self.weekly_roundup_hours.into()),
            ScheduledKind::HumorousSurprise => {
                Duration::hours(self.humorous_surprise_hours.into())
            }
            ScheduledKind::InactivityReminder => {
                Duration::hours(self.inactivity_rearm_hours.into())
            }
        }
    }

    /// How long the user must be away before the inactivity reminder is due.
    pub fn inactivity_threshold(&self) -> Duration {
        Duration::days(self.inactivity_threshold_days.into())
    }
}

impl CurationConfig {
    pub fn staleness_threshold(&self) -> Duration {
        Duration::hours(self.stale_hours.into())
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
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(invalid("config key is empty".into()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| invalid("unknown config key".into()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| invalid("unknown config key".into()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(format!("cannot parse '{value}': {e}")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
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
                .ok_or_else(|| invalid("unknown config key".into()))?;
        }

        Err(invalid("unknown config key".into()))
    }

    /// Default config file location.
    ///
    /// # Errors
    /// Returns an error if the data directory is unusable.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    ///
    /// # Errors
    /// See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    /// See [`Config::save`].
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
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
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            Self::default()
        })
    }
}
