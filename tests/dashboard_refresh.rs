mod support;

use support::hr_stub::{self, StubResponse};

use std::time::Duration;

use talentdeck::api::HrClient;
use talentdeck::controller::DashboardController;
use talentdeck::diagnostics::{DiagnosticLog, LogLevel, MemoryLogStorage};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const METRICS_PATH: &str = "/api/hr/metrics";
const CANDIDATES_PATH: &str = "/api/hr/candidates";

fn candidate_json(id: &str, created_at: OffsetDateTime, skills: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": format!("Candidate {id}"),
        "email": format!("{id}@example.test"),
        "createdAt": created_at.format(&Rfc3339).unwrap(),
        "skills": skills,
    })
}

fn candidates_body() -> String {
    let now = OffsetDateTime::now_utc();
    serde_json::json!([
        candidate_json("new", now - time::Duration::hours(1), &["Go", "Rust"]),
        candidate_json("week", now - time::Duration::days(2), &["Go", "Rust"]),
        candidate_json("month", now - time::Duration::days(10), &["SQL"]),
        candidate_json("old", now - time::Duration::days(40), &[]),
    ])
    .to_string()
}

fn controller_for(base_url: &str) -> DashboardController {
    DashboardController::with_parts(
        HrClient::new(base_url),
        DiagnosticLog::load(Box::new(MemoryLogStorage::new())),
        Duration::from_secs(600),
    )
}

fn has_level(controller: &DashboardController, level: LogLevel) -> bool {
    controller.logs().iter().any(|entry| entry.level == level)
}

#[test]
fn successful_refresh_publishes_derived_snapshot() {
    let base = hr_stub::serve(vec![
        (
            METRICS_PATH,
            vec![StubResponse::ok(r#"{"openRoles":4,"uploadsToday":1}"#)],
        ),
        (CANDIDATES_PATH, vec![StubResponse::ok(candidates_body())]),
    ]);
    let controller = controller_for(&base);
    let notified = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = notified.clone();
    controller.on_refresh(move |_| {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    });
    controller.refresh_blocking();

    let snapshot = controller.snapshot().expect("snapshot published");
    assert_eq!(notified.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert!(!snapshot.has_error);
    assert!(controller.last_error().is_none());
    assert_eq!(snapshot.stats.total_candidates, 4);
    assert_eq!(snapshot.stats.candidates_this_week, 2);
    assert_eq!(snapshot.stats.candidates_this_month, 3);
    assert_eq!(snapshot.stats.metrics.len(), 2);
    assert_eq!(snapshot.recent_candidates.len(), 4);
    assert_eq!(snapshot.recent_candidates[0].id, "new");
    // Ties rank by first-seen order: Go appears before Rust.
    assert_eq!(snapshot.stats.top_skills[0].skill, "Go");
    assert_eq!(snapshot.stats.top_skills[0].count, 2);
    assert_eq!(snapshot.stats.top_skills[1].skill, "Rust");
    assert!(has_level(&controller, LogLevel::Info));
    assert!(!has_level(&controller, LogLevel::Error));
}

#[test]
fn metrics_failure_degrades_to_empty_metrics() {
    let base = hr_stub::serve(vec![
        (
            METRICS_PATH,
            vec![StubResponse::status(500, r#"{"message":"metrics broken"}"#)],
        ),
        (CANDIDATES_PATH, vec![StubResponse::ok(candidates_body())]),
    ]);
    let controller = controller_for(&base);
    controller.refresh_blocking();

    let snapshot = controller.snapshot().expect("snapshot published");
    assert!(!snapshot.has_error);
    assert_eq!(snapshot.stats.total_candidates, 4);
    assert!(snapshot.stats.metrics.is_empty());
    assert!(has_level(&controller, LogLevel::Warn));
    assert!(!has_level(&controller, LogLevel::Error));
}

#[test]
fn candidate_failure_is_fatal_and_degrades_first_snapshot() {
    let base = hr_stub::serve(vec![
        (METRICS_PATH, vec![StubResponse::ok("{}")]),
        (
            CANDIDATES_PATH,
            vec![StubResponse::status(404, r#"{"error":"gone"}"#)],
        ),
    ]);
    let controller = controller_for(&base);
    controller.refresh_blocking();

    let snapshot = controller.snapshot().expect("degraded snapshot published");
    assert!(snapshot.has_error);
    assert_eq!(snapshot.stats.total_candidates, 0);
    assert!(snapshot.recent_candidates.is_empty());
    assert!(controller.last_error().is_some());
    assert!(has_level(&controller, LogLevel::Error));
}

#[test]
fn server_fault_without_prior_snapshot_surfaces_error_only() {
    let base = hr_stub::serve(vec![
        (METRICS_PATH, vec![StubResponse::ok("{}")]),
        (
            CANDIDATES_PATH,
            vec![StubResponse::status(503, r#"{"message":"db down"}"#)],
        ),
    ]);
    let controller = controller_for(&base);
    controller.refresh_blocking();

    assert!(controller.snapshot().is_none());
    assert!(controller.last_error().is_some());
    assert!(has_level(&controller, LogLevel::Error));
}

#[test]
fn server_fault_retains_previous_snapshot() {
    let base = hr_stub::serve(vec![
        (METRICS_PATH, vec![StubResponse::ok("{}")]),
        (
            CANDIDATES_PATH,
            vec![
                StubResponse::ok(candidates_body()),
                StubResponse::status(503, r#"{"message":"db down"}"#),
            ],
        ),
    ]);
    let controller = controller_for(&base);

    controller.refresh_blocking();
    let before = controller.snapshot().expect("first snapshot");
    assert!(!before.has_error);

    controller.refresh_blocking();
    let after = controller.snapshot().expect("snapshot retained");
    assert_eq!(after, before);
    assert!(controller.last_error().is_some());
}

#[test]
fn started_controller_fetches_in_the_background() {
    let base = hr_stub::serve(vec![
        (METRICS_PATH, vec![StubResponse::ok("{}")]),
        (CANDIDATES_PATH, vec![StubResponse::ok(candidates_body())]),
    ]);
    let mut controller = controller_for(&base);
    controller.start();

    let mut snapshot = None;
    for _ in 0..400 {
        snapshot = controller.snapshot();
        if snapshot.is_some() {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    let snapshot = snapshot.expect("background refresh published a snapshot");
    assert_eq!(snapshot.stats.total_candidates, 4);

    controller.shutdown();
    assert!(controller.snapshot().is_some());
}

#[test]
fn export_and_clear_cover_the_user_actions() {
    let base = hr_stub::serve(vec![
        (METRICS_PATH, vec![StubResponse::ok("{}")]),
        (CANDIDATES_PATH, vec![StubResponse::ok(candidates_body())]),
    ]);
    let controller = controller_for(&base);
    controller.refresh_blocking();

    let export = controller.export_logs().expect("export succeeds");
    assert!(export.file_name.starts_with("talentdeck-logs-"));
    assert!(export.file_name.ends_with(".json"));
    let parsed: serde_json::Value = serde_json::from_slice(&export.bytes).unwrap();
    assert!(parsed.as_array().is_some_and(|entries| !entries.is_empty()));

    controller.clear_logs();
    assert!(controller.logs().is_empty());
}
