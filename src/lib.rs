//! Library exports for reuse in the binary and integration tests.
/// Typed client for the HR service endpoints.
pub mod api;
/// Application directory helpers.
pub mod app_dirs;
/// Dashboard configuration persistence.
pub mod config;
/// Dashboard state controller.
pub mod controller;
/// Capacity-bounded, persisted diagnostic log.
pub mod diagnostics;
/// Shared HTTP client configuration.
pub mod http_client;
/// Logging setup.
pub mod logging;
/// Concurrent dashboard data fetch.
pub mod orchestrator;
/// Periodic and manual refresh driving.
pub mod scheduler;
/// Derived dashboard statistics.
pub mod stats;
