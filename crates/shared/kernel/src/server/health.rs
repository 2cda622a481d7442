use super::state::ApiState;
use axum::extract::State;
use axum::http::header;
use axum::{Json, response::IntoResponse};
use ingest_domain::constants::SYSTEM_TAG;
use serde::Serialize;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

const DATABASE_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status
    status: &'static str,
    /// Version
    version: &'static str,
    /// Uptime in seconds
    uptime: u64,
    /// Whether a database connection could be used
    database: &'static str,
}

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Starts the uptime clock. Call once at startup; later calls are no-ops.
pub fn start_clock() {
    LazyLock::force(&START_TIME);
}

fn uptime() -> u64 {
    START_TIME.elapsed().as_secs()
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = OK, description = "Healthcheck endpoint", body = HealthResponse)),
    tag = SYSTEM_TAG,
)]
pub(super) async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let database = match tokio::time::timeout(DATABASE_PROBE_TIMEOUT, state.database.health()).await
    {
        Ok(Ok(())) => "up",
        _ => "down",
    };

    let body = HealthResponse {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        uptime: uptime(),
        database,
    };

    (
        [
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(body),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_counts_from_the_clock_start() {
        start_clock();
        std::thread::sleep(Duration::from_millis(1100));
        start_clock();
        assert!(uptime() >= 1);
    }
}
