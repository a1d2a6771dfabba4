use crate::routes::AppState;
use application::StorageCheck;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Upper bound for a single storage ping.
pub const READINESS_TIMEOUT: Duration = Duration::from_secs(3);

const HEALTHY: &str = "Healthy";
const UNHEALTHY: &str = "Unhealthy";

#[derive(Serialize, Debug)]
pub struct HealthReport {
    pub status: &'static str,
    pub checks: Vec<CheckReport>,
}

#[derive(Serialize, Debug)]
pub struct CheckReport {
    pub name: String,
    pub status: &'static str,
    pub exception: String,
    pub duration: String,
}

impl HealthReport {
    fn is_healthy(&self) -> bool {
        self.status == HEALTHY
    }
}

/// Pings every storage check, each bounded by `timeout`. The report is
/// healthy only when all checks pass; no checks at all means healthy.
pub async fn readiness_report(
    health_checks: &[Arc<dyn StorageCheck>],
    timeout: Duration,
) -> HealthReport {
    let mut checks = Vec::with_capacity(health_checks.len());
    for check in health_checks {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(timeout, check.ping()).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!("timed out after {:?}", timeout)),
        };
        let duration = format!("{:?}", started.elapsed());
        checks.push(match outcome {
            None => CheckReport {
                name: check.name().to_string(),
                status: HEALTHY,
                exception: "none".to_string(),
                duration,
            },
            Some(message) => {
                warn!(check = check.name(), "Readiness check failed: {}", message);
                CheckReport {
                    name: check.name().to_string(),
                    status: UNHEALTHY,
                    exception: message,
                    duration,
                }
            }
        });
    }
    let status = if checks.iter().all(|check| check.status == HEALTHY) {
        HEALTHY
    } else {
        UNHEALTHY
    };
    HealthReport { status, checks }
}

/// Handler for GET /health/ready. 503 when any storage check fails.
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let report = readiness_report(&state.health_checks, READINESS_TIMEOUT).await;
    info!(status = report.status, "Readiness check completed");
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}

/// Handler for GET /health/live. Runs no checks.
pub async fn live_handler() -> impl IntoResponse {
    (StatusCode::OK, HEALTHY)
}
