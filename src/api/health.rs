use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::infrastructure::AppState;

/// Liveness plus a round trip to the lending database
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service and database reachable"),
        (status = 503, description = "Database unreachable")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.db().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "database": "ok",
                "service": "asset-lending",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => {
            tracing::error!("Health check could not reach the database: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "database": "unreachable",
                    "service": "asset-lending"
                })),
            )
        }
    }
}
