//! Configuration management for tidylist
//!
//! This module handles loading, parsing, and validation of configuration files.

use crate::constants::{
    APP_DIR_NAME, CALENDAR_EVENT_MINUTES, CONFIG_GENERATED, DEFAULT_CALENDAR_ID, DEFAULT_TIME_ZONE,
    MAX_RETENTION_DAYS, REMINDER_LEAD_MINUTES, STORAGE_NAMESPACE, TASK_AUTO_DELETE_DAYS,
};
use crate::retention::RetentionPolicy;
use crate::scheduling::SchedulingOptions;
use crate::storage::{JsonFileStorage, PersistedState};
use crate::store::StoreOptions;
use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub retention: RetentionConfig,
    pub notifications: NotificationConfig,
    pub calendar: CalendarConfig,
    pub logging: LoggingConfig,
    pub defaults: DefaultsConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Namespace of the persisted state blob (file name without extension)
    pub namespace: String,
    /// Explicit state file path; defaults to the platform data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Retention configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Whole days a completed task is kept when auto-delete is on
    pub window_days: i64,
}

/// Due-date reminder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Schedule due-date reminders at all
    pub enabled: bool,
    /// Minutes before the due date at which the reminder fires
    pub lead_minutes: i64,
}

/// Calendar configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub calendar_id: String,
    pub time_zone: String,
    /// Length of the event recorded for a completed task
    pub event_minutes: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging to a file in the data directory
    pub enabled: bool,
    /// Level filter: off, error, warn, info, debug, trace
    pub level: String,
}

/// Initial store flags, used only when nothing has been persisted yet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub dark_mode: bool,
    pub auto_delete_enabled: bool,
    pub google_calendar_sync: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: STORAGE_NAMESPACE.to_string(),
            path: None,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            window_days: TASK_AUTO_DELETE_DAYS,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lead_minutes: REMINDER_LEAD_MINUTES,
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            event_minutes: CALENDAR_EVENT_MINUTES,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        let initial = PersistedState::default();
        Self {
            dark_mode: initial.dark_mode,
            auto_delete_enabled: initial.auto_delete_enabled,
            google_calendar_sync: initial.google_calendar_sync,
        }
    }
}

impl LoggingConfig {
    /// Parsed level filter
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        log::LevelFilter::from_str(&self.level).map_err(|_| anyhow::anyhow!("Invalid logging level '{}'", self.level))
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file();

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from(format!("{}.toml", APP_DIR_NAME));
        if current_dir_config.exists() {
            return Some(current_dir_config);
        }

        // 2. Check XDG config directory
        if let Ok(xdg_config) = Self::get_default_config_path() {
            if xdg_config.exists() {
                return Some(xdg_config);
            }
        }

        None
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.storage.namespace.trim().is_empty() {
            anyhow::bail!("storage.namespace cannot be empty");
        }
        if self.storage.namespace.contains(['/', '\\']) {
            anyhow::bail!("storage.namespace '{}' must not contain path separators", self.storage.namespace);
        }

        if !(1..=MAX_RETENTION_DAYS).contains(&self.retention.window_days) {
            anyhow::bail!(
                "retention.window_days must be between 1 and {}, got {}",
                MAX_RETENTION_DAYS,
                self.retention.window_days
            );
        }

        if !(1..=1440).contains(&self.notifications.lead_minutes) {
            anyhow::bail!(
                "notifications.lead_minutes must be between 1 and 1440, got {}",
                self.notifications.lead_minutes
            );
        }

        if !(1..=1440).contains(&self.calendar.event_minutes) {
            anyhow::bail!(
                "calendar.event_minutes must be between 1 and 1440, got {}",
                self.calendar.event_minutes
            );
        }
        if self.calendar.calendar_id.is_empty() {
            anyhow::bail!("calendar.calendar_id cannot be empty");
        }
        if self.calendar.time_zone.is_empty() {
            anyhow::bail!("calendar.time_zone cannot be empty");
        }

        self.logging.level_filter()?;

        Ok(())
    }

    /// Path of the persisted state file
    pub fn storage_path(&self) -> Result<PathBuf> {
        Ok(JsonFileStorage::from_config(self)?.path().to_path_buf())
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy::from_days(self.retention.window_days)
    }

    pub fn scheduling_options(&self) -> SchedulingOptions {
        SchedulingOptions {
            reminder_lead: Duration::minutes(self.notifications.lead_minutes),
            calendar_id: self.calendar.calendar_id.clone(),
            time_zone: self.calendar.time_zone.clone(),
            event_duration: Duration::minutes(self.calendar.event_minutes),
        }
    }

    /// Options for opening a [`TaskStore`](crate::store::TaskStore)
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            initial: PersistedState {
                dark_mode: self.defaults.dark_mode,
                auto_delete_enabled: self.defaults.auto_delete_enabled,
                google_calendar_sync: self.defaults.google_calendar_sync,
                ..PersistedState::default()
            },
            retention: self.retention_policy(),
            reminders_enabled: self.notifications.enabled,
        }
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# tidylist Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        log::info!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join(APP_DIR_NAME))
    }

    /// Get the data directory holding the state and log files
    pub fn get_data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
            .map(|dir| dir.join(APP_DIR_NAME))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }
}
