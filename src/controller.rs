//! Dashboard state controller.
//!
//! Owns the single current snapshot and composes the diagnostic log, fetch
//! orchestrator, statistics deriver, and refresh scheduler into the state
//! the view layer reads. Snapshots are replaced atomically and never
//! mutated in place.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;

use crate::api::{Candidate, HrClient};
use crate::config::{ConfigError, DashboardConfig};
use crate::diagnostics::{DiagnosticLog, ExportError, LogEntry, LogExport, LogLevel, LogStorage};
use crate::orchestrator::{self, Orchestration, OrchestrationError};
use crate::scheduler::RefreshScheduler;
use crate::stats::{self, DashboardStats};

/// Maximum number of candidates carried in a snapshot.
pub const RECENT_CANDIDATE_COUNT: usize = 10;

const FETCH_FAILED_MESSAGE: &str =
    "Failed to load dashboard data. Please check your connection and try again.";

/// One immutable, fully-formed view of dashboard state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    /// At most [`RECENT_CANDIDATE_COUNT`] records, most recent first as
    /// returned by the service.
    pub recent_candidates: Vec<Candidate>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    pub fetch_duration_ms: u64,
    pub has_error: bool,
}

type RefreshListener = Box<dyn Fn(&DashboardSnapshot) + Send>;

struct Shared {
    snapshot: Mutex<Option<DashboardSnapshot>>,
    error: Mutex<Option<String>>,
    listeners: Mutex<Vec<RefreshListener>>,
    disposed: AtomicBool,
}

impl Shared {
    fn new() -> Self {
        Self {
            snapshot: Mutex::new(None),
            error: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        }
    }

    fn publish(&self, snapshot: DashboardSnapshot) {
        *lock(&self.snapshot) = Some(snapshot.clone());
        for listener in lock(&self.listeners).iter() {
            listener(&snapshot);
        }
    }
}

/// Composes fetching, derivation, diagnostics, and scheduling behind a
/// snapshot the rendering layer polls.
pub struct DashboardController {
    client: HrClient,
    log: DiagnosticLog,
    shared: Arc<Shared>,
    scheduler: Option<RefreshScheduler>,
    refresh_interval: Duration,
}

impl DashboardController {
    /// Build a controller from configuration and a diagnostic storage
    /// backend.
    pub fn new(
        config: &DashboardConfig,
        storage: Box<dyn LogStorage>,
    ) -> Result<Self, ConfigError> {
        let base_url = config.validated_base_url()?;
        let log = DiagnosticLog::load(storage);
        log.append(LogLevel::Info, "Dashboard controller initialized");
        Ok(Self::with_parts(
            HrClient::new(base_url),
            log,
            config.refresh_interval(),
        ))
    }

    /// Build a controller from already-constructed parts.
    pub fn with_parts(client: HrClient, log: DiagnosticLog, refresh_interval: Duration) -> Self {
        Self {
            client,
            log,
            shared: Arc::new(Shared::new()),
            scheduler: None,
            refresh_interval,
        }
    }

    /// Start the background refresh loop and kick an immediate first fetch.
    /// Calling `start` twice is a no-op.
    pub fn start(&mut self) {
        if self.scheduler.is_some() {
            return;
        }
        self.log.append_with(
            LogLevel::Debug,
            "Auto-refresh interval scheduled",
            Some(serde_json::json!({
                "intervalSecs": self.refresh_interval.as_secs(),
            })),
            None,
        );
        let client = self.client.clone();
        let log = self.log.clone();
        let shared = self.shared.clone();
        let scheduler = RefreshScheduler::start(self.refresh_interval, move || {
            let outcome = orchestrator::run(&client, &log);
            apply_outcome(&shared, outcome);
        });
        scheduler.trigger();
        self.scheduler = Some(scheduler);
    }

    /// Request an immediate refresh; dropped if one is already in flight.
    pub fn refresh_now(&self) {
        self.log
            .append(LogLevel::Info, "Manual refresh triggered by user");
        if let Some(scheduler) = &self.scheduler {
            scheduler.trigger();
        }
    }

    /// Run exactly one orchestration on the calling thread and apply its
    /// result. Used by the headless binary and by tests; the scheduler's
    /// in-flight guard does not cover this path.
    pub fn refresh_blocking(&self) {
        let outcome = orchestrator::run(&self.client, &self.log);
        apply_outcome(&self.shared, outcome);
    }

    /// Latest published snapshot, or `None` before the first successful
    /// fetch.
    pub fn snapshot(&self) -> Option<DashboardSnapshot> {
        lock(&self.shared.snapshot).clone()
    }

    /// Register a callback invoked whenever a new snapshot is published.
    pub fn on_refresh(&self, listener: impl Fn(&DashboardSnapshot) + Send + 'static) {
        lock(&self.shared.listeners).push(Box::new(listener));
    }

    /// User-facing message for the most recent fatal failure, cleared by
    /// the next successful refresh.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.shared.error).clone()
    }

    /// Current diagnostic entries, newest first.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.log.all()
    }

    /// Serialize the diagnostic buffer for download.
    pub fn export_logs(&self) -> Result<LogExport, ExportError> {
        self.log.export()
    }

    /// Empty the diagnostic buffer and its durable copy.
    pub fn clear_logs(&self) {
        self.log.clear();
    }

    /// Tear down: cancel the scheduler and discard any late-landing result.
    pub fn shutdown(&mut self) {
        self.shared.disposed.store(true, Ordering::SeqCst);
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.cancel();
        }
    }
}

impl Drop for DashboardController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn apply_outcome(shared: &Shared, outcome: Result<Orchestration, OrchestrationError>) {
    if shared.disposed.load(Ordering::SeqCst) {
        return;
    }
    match outcome {
        Ok(orchestration) => {
            *lock(&shared.error) = None;
            shared.publish(success_snapshot(&orchestration));
        }
        Err(err) => {
            *lock(&shared.error) = Some(FETCH_FAILED_MESSAGE.to_string());
            // A prior snapshot is kept as-is; the user keeps the data they
            // were looking at. Without one, a non-server fault still yields
            // a degraded snapshot so the view keeps its shape.
            let has_snapshot = lock(&shared.snapshot).is_some();
            if !has_snapshot && !err.server_fault() {
                shared.publish(degraded_snapshot(err.duration_ms));
            }
        }
    }
}

fn success_snapshot(orchestration: &Orchestration) -> DashboardSnapshot {
    let stats = stats::derive(&orchestration.candidates, orchestration.metrics.clone());
    DashboardSnapshot {
        stats,
        recent_candidates: orchestration
            .candidates
            .iter()
            .take(RECENT_CANDIDATE_COUNT)
            .cloned()
            .collect(),
        last_updated: OffsetDateTime::now_utc(),
        fetch_duration_ms: orchestration.duration_ms,
        has_error: false,
    }
}

fn degraded_snapshot(duration_ms: u64) -> DashboardSnapshot {
    DashboardSnapshot {
        stats: stats::derive(&[], crate::api::Metrics::new()),
        recent_candidates: Vec::new(),
        last_updated: OffsetDateTime::now_utc(),
        fetch_duration_ms: duration_ms,
        has_error: true,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|err| err.into_inner())
}
