//! The bounded diagnostic log store.

use std::sync::{Arc, Mutex};

use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

use super::storage::LogStorage;
use super::{ErrorInfo, LOG_CAPACITY, LogEntry, LogLevel};

const EXPORT_FILE_PREFIX: &str = "talentdeck-logs";

/// Errors produced while building a log export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to serialize logs: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to format export filename: {0}")]
    FormatTime(#[from] time::error::Format),
}

/// A downloadable serialization of the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct LogExport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

struct LogInner {
    entries: Vec<LogEntry>,
    storage: Box<dyn LogStorage>,
}

/// Cheaply cloneable handle to the shared diagnostic buffer.
///
/// Appends are serialized by an internal lock, so entry order reflects the
/// causal order of the operations that produced them. The in-memory buffer
/// stays authoritative for the session even when persistence fails.
#[derive(Clone)]
pub struct DiagnosticLog {
    inner: Arc<Mutex<LogInner>>,
}

impl DiagnosticLog {
    /// Initialize the buffer from durable storage.
    ///
    /// An absent or corrupt persisted buffer yields an empty store; neither
    /// case is an error for the caller.
    pub fn load(storage: Box<dyn LogStorage>) -> Self {
        let entries = match storage.get() {
            Ok(None) => {
                tracing::info!("No stored diagnostic logs found; starting empty");
                Vec::new()
            }
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<LogEntry>>(&bytes) {
                Ok(mut entries) => {
                    entries.truncate(LOG_CAPACITY);
                    tracing::info!(count = entries.len(), "Loaded stored diagnostic logs");
                    entries
                }
                Err(err) => {
                    tracing::error!("Stored diagnostic logs are corrupt, starting empty: {err}");
                    Vec::new()
                }
            },
            Err(err) => {
                tracing::error!("Could not read stored diagnostic logs: {err}");
                Vec::new()
            }
        };
        Self {
            inner: Arc::new(Mutex::new(LogInner { entries, storage })),
        }
    }

    /// Append an entry with just a message.
    pub fn append(&self, level: LogLevel, message: impl Into<String>) -> LogEntry {
        self.append_with(level, message, None, None)
    }

    /// Append an entry with optional structured payload and error details.
    ///
    /// The buffer is truncated to the [`LOG_CAPACITY`] newest entries and
    /// persisted before returning. Persistence failures are absorbed.
    pub fn append_with(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
        error: Option<ErrorInfo>,
    ) -> LogEntry {
        let entry = LogEntry::new(level, message.into(), data, error);
        mirror_to_tracing(&entry);

        let mut inner = self.lock();
        inner.entries.insert(0, entry.clone());
        inner.entries.truncate(LOG_CAPACITY);
        persist(&mut inner);
        entry
    }

    /// All entries, newest first.
    pub fn all(&self) -> Vec<LogEntry> {
        self.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Empty the buffer and remove the durable copy. Irreversible; any
    /// confirmation step belongs to the caller.
    pub fn clear(&self) {
        let mut inner = self.lock();
        let previous = inner.entries.len();
        inner.entries.clear();
        if let Err(err) = inner.storage.remove() {
            tracing::warn!("Could not remove persisted diagnostic logs: {err}");
        }
        tracing::info!(previous_count = previous, "Diagnostic logs cleared");
    }

    /// Serialize the buffer for download, named with the current date.
    pub fn export(&self) -> Result<LogExport, ExportError> {
        let export = {
            let inner = self.lock();
            match build_export(&inner.entries, OffsetDateTime::now_utc()) {
                Ok(export) => export,
                Err(err) => {
                    tracing::error!("Failed to export diagnostic logs: {err}");
                    return Err(err);
                }
            }
        };
        self.append_with(
            LogLevel::Info,
            "Logs exported",
            Some(serde_json::json!({ "logCount": self.len() })),
            None,
        );
        Ok(export)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LogInner> {
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }
}

fn persist(inner: &mut LogInner) {
    let bytes = match serde_json::to_vec(&inner.entries) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!("Could not serialize diagnostic logs for persistence: {err}");
            return;
        }
    };
    if let Err(err) = inner.storage.set(&bytes) {
        tracing::warn!("Could not persist diagnostic logs: {err}");
    }
}

fn build_export(entries: &[LogEntry], now: OffsetDateTime) -> Result<LogExport, ExportError> {
    const DATE_FORMAT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");
    let date = now.format(DATE_FORMAT)?;
    Ok(LogExport {
        file_name: format!("{EXPORT_FILE_PREFIX}-{date}.json"),
        bytes: serde_json::to_vec_pretty(entries)?,
    })
}

fn mirror_to_tracing(entry: &LogEntry) {
    let detail = entry
        .error
        .as_ref()
        .map(|error| format!(" ({}: {})", error.name, error.message))
        .unwrap_or_default();
    match entry.level {
        LogLevel::Debug => tracing::debug!("{}{detail}", entry.message),
        LogLevel::Info => tracing::info!("{}{detail}", entry.message),
        LogLevel::Warn => tracing::warn!("{}{detail}", entry.message),
        LogLevel::Error => tracing::error!("{}{detail}", entry.message),
    }
}
