pub mod auth;
pub mod health;
pub mod lending;

use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use crate::domain::DomainError;
use crate::infrastructure::AppState;

pub type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/login-otp", post(auth::login_otp))
        // Lending
        .route("/manage-assets/show-all", get(lending::show_all))
        .route("/manage-assets/create-new", post(lending::create_new))
        .route("/manage-assets/find/:id", get(lending::find_by_id))
        .route("/manage-assets/find-asset", post(lending::find_by_name))
        .route(
            "/manage-assets/download/list-assets",
            get(lending::download_list),
        )
        .route("/manage-assets/:id/return", put(lending::return_transaction))
        .with_state(state)
}

/// Map a domain error onto its HTTP status with an `{ "error": ... }` body
pub fn domain_error_response(err: DomainError) -> (StatusCode, Json<Value>) {
    let status = match &err {
        DomainError::BadRequest(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::InvariantViolation { .. } => StatusCode::CONFLICT,
        DomainError::StoreFailure(_) | DomainError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(json!({ "error": err.to_string() })))
}
