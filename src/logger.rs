//! Logging setup and the in-memory diagnostic buffer.
//!
//! All crate diagnostics go through the `log` facade. [`Logger::install`]
//! routes them through `fern` into a bounded in-memory buffer (for a UI debug
//! panel) and, when enabled, into a log file in the data directory.

use anyhow::{Context, Result};
use chrono::Local;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::{Config, LoggingConfig};
use crate::constants::{LOG_FILE_NAME, MAX_LOG_ENTRIES};

/// Shared logger that can be used across the application
#[derive(Clone)]
pub struct Logger {
    logs: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Logger {
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOG_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            logs: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(64)))),
            capacity: capacity.max(1),
        }
    }

    /// Add a log entry, evicting the oldest once full
    pub fn log(&self, message: String) {
        let timestamp = Local::now().format("%H:%M:%S%.3f").to_string();
        self.push(format!("[{}] {}", timestamp, message));
    }

    fn push(&self, line: String) {
        if let Ok(mut logs) = self.logs.lock() {
            if logs.len() == self.capacity {
                logs.pop_front();
            }
            logs.push_back(line);
        }
    }

    /// Get all logs, newest first
    pub fn get_logs(&self) -> Vec<String> {
        if let Ok(logs) = self.logs.lock() {
            logs.iter().rev().cloned().collect()
        } else {
            Vec::new()
        }
    }

    /// Clear all logs
    pub fn clear(&self) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.clear();
        }
    }

    /// Location of the log file used when file logging is enabled
    pub fn get_log_file_path() -> Result<PathBuf> {
        Ok(Config::get_data_dir()?.join(LOG_FILE_NAME))
    }

    /// Install this logger as the global `log` backend.
    ///
    /// Fails if a global logger has already been set.
    pub fn install(&self, config: &LoggingConfig) -> Result<()> {
        let level = config.level_filter()?;
        let sink = self.clone();

        let mut dispatch = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{} {:<5} [{}] {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .level(level)
            .chain(fern::Output::call(move |record| {
                sink.push(record.args().to_string());
            }));

        if config.enabled {
            let path = Self::get_log_file_path()?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
            }
            let file = fern::log_file(&path).with_context(|| format!("Failed to open log file: {}", path.display()))?;
            dispatch = dispatch.chain(file);
        }

        dispatch.apply().context("A global logger is already installed")?;
        Ok(())
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}
