//! User-visible diagnostic log: a capacity-bounded, time-ordered buffer of
//! structured entries, mirrored to durable storage so it survives restarts.
//!
//! This buffer is what the dashboard shows, exports, and clears. It is
//! independent of the process-level tracing setup in [`crate::logging`];
//! every append is mirrored there at the matching level.

mod storage;
mod store;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub use storage::{FileLogStorage, LogStorage, MemoryLogStorage, StorageError};
pub use store::{DiagnosticLog, ExportError, LogExport};

/// Maximum number of entries retained in the buffer.
pub const LOG_CAPACITY: usize = 50;

/// Severity of a diagnostic entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Structured description of an error attached to a log entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }
}

/// One immutable diagnostic entry. Identity is the `id`; the buffer orders
/// entries newest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl LogEntry {
    pub(crate) fn new(
        level: LogLevel,
        message: String,
        data: Option<serde_json::Value>,
        error: Option<ErrorInfo>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: OffsetDateTime::now_utc(),
            level,
            message,
            data,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "\"warn\"");
        let parsed: LogLevel = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, LogLevel::Error);
    }

    #[test]
    fn entry_round_trips_through_json() {
        let entry = LogEntry::new(
            LogLevel::Info,
            "Refresh finished".to_string(),
            Some(serde_json::json!({ "candidateCount": 3 })),
            Some(ErrorInfo::new("FetchError", "HTTP 500")),
        );
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let entry = LogEntry::new(LogLevel::Debug, "dispatch".to_string(), None, None);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("\"data\""));
        assert!(!json.contains("\"error\""));
    }
}
