//! Filesystem locations for the dashboard client.
//!
//! Everything the client persists (config, tracing log files, the
//! diagnostic buffer) lives under one `.talentdeck` directory inside the
//! OS config root. A `TALENTDECK_CONFIG_HOME` environment variable
//! relocates the whole tree, which tests and portable installs rely on.

use std::{
    path::{Path, PathBuf},
    sync::{LazyLock, Mutex},
};

use directories::BaseDirs;
use thiserror::Error;

/// Name of the application directory under the OS config root.
pub const APP_DIR_NAME: &str = ".talentdeck";

/// Subdirectory holding per-launch tracing log files.
const LOGS_SUBDIR: &str = "logs";

static CONFIG_BASE_OVERRIDE: LazyLock<Mutex<Option<PathBuf>>> = LazyLock::new(|| Mutex::new(None));

/// Errors raised while resolving or preparing application directories.
#[derive(Debug, Error)]
pub enum AppDirError {
    /// No suitable base config directory could be resolved.
    #[error("No suitable base config directory available for application files")]
    NoBaseDir,
    /// Failed to create the application directory.
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Return the `.talentdeck` root, creating it if needed.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = resolve_base()?;
    ensure_dir(base.join(APP_DIR_NAME))
}

/// Return the tracing-log directory under the root, creating it if needed.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join(LOGS_SUBDIR))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    match std::fs::create_dir_all(&path) {
        Ok(()) => Ok(path),
        Err(source) => Err(AppDirError::CreateDir { path, source }),
    }
}

fn resolve_base() -> Result<PathBuf, AppDirError> {
    if let Some(path) = CONFIG_BASE_OVERRIDE
        .lock()
        .ok()
        .and_then(|guard| guard.clone())
    {
        return Ok(path);
    }
    if let Ok(path) = std::env::var("TALENTDECK_CONFIG_HOME") {
        return Ok(PathBuf::from(path));
    }
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(AppDirError::NoBaseDir)
}

#[cfg(test)]
pub(crate) fn with_config_base<T>(base: &Path, body: impl FnOnce() -> T) -> T {
    // Serialize tests that redirect the base so they never observe
    // each other's override.
    static TEST_LOCK: Mutex<()> = Mutex::new(());
    let _serial = TEST_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    {
        let mut guard = CONFIG_BASE_OVERRIDE
            .lock()
            .expect("config base override mutex poisoned");
        *guard = Some(base.to_path_buf());
    }
    let result = body();
    {
        let mut guard = CONFIG_BASE_OVERRIDE
            .lock()
            .expect("config base override mutex poisoned");
        *guard = None;
    }
    result
}
