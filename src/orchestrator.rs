//! One coordinated refresh of all dashboard data sources.
//!
//! The metrics and candidate-list requests are issued concurrently and both
//! are settled before any decision is made (a join, not a race). The failure
//! policy is asymmetric: metrics are best-effort and degrade to an empty
//! object, while a candidate-list failure fails the whole orchestration.

use std::thread;
use std::time::Instant;

use crate::api::{Candidate, FetchError, HrClient, Metrics};
use crate::diagnostics::{DiagnosticLog, ErrorInfo, LogLevel};

/// Successful (or partially successful) refresh payload.
#[derive(Clone, Debug)]
pub struct Orchestration {
    pub candidates: Vec<Candidate>,
    pub metrics: Metrics,
    pub duration_ms: u64,
}

/// A fatal refresh failure: the candidate list could not be fetched.
#[derive(Debug, thiserror::Error)]
#[error("Dashboard data fetch failed: {cause}")]
pub struct OrchestrationError {
    pub cause: FetchError,
    pub duration_ms: u64,
}

impl OrchestrationError {
    /// Whether the cause was a server-side (5xx) fault. The controller keeps
    /// the previous snapshot in that case instead of degrading.
    pub fn server_fault(&self) -> bool {
        self.cause.is_server_fault()
    }
}

/// How the pair of tagged per-source outcomes resolves under the asymmetric
/// failure policy.
#[derive(Debug)]
pub(crate) enum Resolution {
    Complete {
        candidates: Vec<Candidate>,
        metrics: Metrics,
    },
    MetricsFallback {
        candidates: Vec<Candidate>,
        metrics_error: FetchError,
    },
    Fatal {
        cause: FetchError,
    },
}

/// Decide the orchestration outcome from both settled results. Pure, so the
/// policy is testable without any network in play.
pub(crate) fn resolve(
    metrics: Result<Metrics, FetchError>,
    candidates: Result<Vec<Candidate>, FetchError>,
) -> Resolution {
    match (candidates, metrics) {
        (Err(cause), _) => Resolution::Fatal { cause },
        (Ok(candidates), Ok(metrics)) => Resolution::Complete {
            candidates,
            metrics,
        },
        (Ok(candidates), Err(metrics_error)) => Resolution::MetricsFallback {
            candidates,
            metrics_error,
        },
    }
}

/// Run one orchestration, logging every request outcome and the aggregate
/// timing to the diagnostic buffer.
pub fn run(client: &HrClient, log: &DiagnosticLog) -> Result<Orchestration, OrchestrationError> {
    let started = Instant::now();
    log.append_with(
        LogLevel::Debug,
        "Executing concurrent dashboard requests",
        Some(serde_json::json!({ "requestCount": 2 })),
        None,
    );

    let (metrics_result, candidates_result) = thread::scope(|scope| {
        let metrics_handle = scope.spawn(|| client.fetch_metrics());
        let candidates = client.fetch_candidates();
        let metrics = match metrics_handle.join() {
            Ok(result) => result,
            Err(_) => Err(FetchError::Transport(
                "Metrics request thread panicked".to_string(),
            )),
        };
        (metrics, candidates)
    });
    let duration_ms = elapsed_ms(started);

    match resolve(metrics_result, candidates_result) {
        Resolution::Fatal { cause } => {
            log.append_with(
                LogLevel::Error,
                "Candidate endpoint failed; dashboard fetch aborted",
                Some(serde_json::json!({
                    "fetchDurationMs": duration_ms,
                    "errorCode": cause.status_code(),
                })),
                Some(ErrorInfo::new("FetchError", cause.to_string())),
            );
            Err(OrchestrationError { cause, duration_ms })
        }
        Resolution::MetricsFallback {
            candidates,
            metrics_error,
        } => {
            log.append_with(
                LogLevel::Warn,
                "Metrics endpoint failed, using empty fallback",
                None,
                Some(ErrorInfo::new("FetchError", metrics_error.to_string())),
            );
            let orchestration = Orchestration {
                candidates,
                metrics: Metrics::new(),
                duration_ms,
            };
            log_success(log, &orchestration);
            Ok(orchestration)
        }
        Resolution::Complete {
            candidates,
            metrics,
        } => {
            let orchestration = Orchestration {
                candidates,
                metrics,
                duration_ms,
            };
            log_success(log, &orchestration);
            Ok(orchestration)
        }
    }
}

fn log_success(log: &DiagnosticLog, orchestration: &Orchestration) {
    log.append_with(
        LogLevel::Info,
        "Dashboard data fetch completed successfully",
        Some(serde_json::json!({
            "fetchDurationMs": orchestration.duration_ms,
            "candidateCount": orchestration.candidates.len(),
            "metricsKeys": orchestration.metrics.len(),
        })),
        None,
    );
}

fn elapsed_ms(started: Instant) -> u64 {
    (started.elapsed().as_secs_f64() * 1000.0).round() as u64
}
