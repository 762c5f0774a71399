use axum::http::StatusCode;

/// Handler for `GET /healthz` — liveness check.
///
/// Readiness (`/readyz`) is defined per service since it depends on the
/// service's backing stores.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
