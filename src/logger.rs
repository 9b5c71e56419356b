//! Leveled SDK logger with a bounded history
//!
//! Every call is mirrored to `tracing`; entries at or above the active
//! level are also kept in a ring buffer so hosts can inspect or export
//! recent SDK activity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use crate::error::CanistError;

/// Maximum number of retained entries
pub const HISTORY_CAP: usize = 1000;

/// Log severity, ordered debug < info < warn < error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = CanistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(CanistError::Config(format!("Unknown log level: {}", other))),
        }
    }
}

/// A stored log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Leveled logger owned by one SDK instance
pub struct Logger {
    level: Mutex<LogLevel>,
    history: Mutex<VecDeque<LogEntry>>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

impl Logger {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: Mutex::new(level),
            history: Mutex::new(VecDeque::with_capacity(HISTORY_CAP)),
        }
    }

    pub fn set_level(&self, level: LogLevel) {
        if let Ok(mut current) = self.level.lock() {
            *current = level;
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level.lock().map(|l| *l).unwrap_or_default()
    }

    /// Record a message. Always mirrored to `tracing`; stored only when
    /// `level` passes the current threshold.
    pub fn log(&self, level: LogLevel, message: &str, data: Option<serde_json::Value>) {
        mirror(level, message, data.as_ref());

        if level < self.level() {
            return;
        }

        let entry = LogEntry {
            level,
            message: message.to_string(),
            timestamp: Utc::now(),
            data,
        };

        let Ok(mut history) = self.history.lock() else {
            return;
        };
        if history.len() >= HISTORY_CAP {
            history.pop_front();
        }
        history.push_back(entry);
    }

    pub fn debug(&self, message: &str, data: Option<serde_json::Value>) {
        self.log(LogLevel::Debug, message, data);
    }

    pub fn info(&self, message: &str, data: Option<serde_json::Value>) {
        self.log(LogLevel::Info, message, data);
    }

    pub fn warn(&self, message: &str, data: Option<serde_json::Value>) {
        self.log(LogLevel::Warn, message, data);
    }

    pub fn error(&self, message: &str, data: Option<serde_json::Value>) {
        self.log(LogLevel::Error, message, data);
    }

    /// Snapshot of retained entries, oldest first
    pub fn logs(&self) -> Vec<LogEntry> {
        self.history
            .lock()
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear_logs(&self) {
        if let Ok(mut history) = self.history.lock() {
            history.clear();
        }
    }

    /// Retained entries as a pretty-printed JSON array
    pub fn export_logs(&self) -> String {
        serde_json::to_string_pretty(&self.logs()).unwrap_or_else(|_| "[]".to_string())
    }
}

fn mirror(level: LogLevel, message: &str, data: Option<&serde_json::Value>) {
    let data = data.map(|d| d.to_string()).unwrap_or_default();
    match level {
        LogLevel::Debug => tracing::debug!(data = %data, "{}", message),
        LogLevel::Info => tracing::info!(data = %data, "{}", message),
        LogLevel::Warn => tracing::warn!(data = %data, "{}", message),
        LogLevel::Error => tracing::error!(data = %data, "{}", message),
    }
}
