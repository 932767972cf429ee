use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use super::{domain_error_response, ApiResult};
use crate::domain::{CheckoutReceipt, CheckoutRequest, LendingHeader, LendingTransaction};
use crate::infrastructure::auth::BorrowerClaims;
use crate::infrastructure::AppState;

#[derive(Deserialize, ToSchema)]
pub struct FindByNameRequest {
    #[serde(default)]
    pub name: String,
}

#[utoipa::path(
    get,
    path = "/api/manage-assets/show-all",
    responses(
        (status = 200, description = "All lending transaction headers", body = [LendingHeader])
    )
)]
pub async fn show_all(State(state): State<AppState>) -> ApiResult {
    let headers = state
        .lending
        .show_all_asset()
        .await
        .map_err(domain_error_response)?;

    Ok(Json(json!(headers)))
}

/// Lend assets to the authenticated user
#[utoipa::path(
    post,
    path = "/api/manage-assets/create-new",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Transaction created", body = CheckoutReceipt),
        (status = 400, description = "Invalid request or insufficient stock"),
        (status = 404, description = "Unknown asset or staff"),
        (status = 503, description = "Asset busy")
    ),
    security(("bearer" = []))
)]
pub async fn create_new(
    State(state): State<AppState>,
    claims: BorrowerClaims,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let receipt = state
        .lending
        .checkout(&claims.sub, request)
        .await
        .map_err(domain_error_response)?;

    Ok((StatusCode::CREATED, Json(json!(receipt))))
}

#[utoipa::path(
    get,
    path = "/api/manage-assets/find/{id}",
    params(("id" = String, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Matching transaction with its lines", body = [LendingTransaction])
    )
)]
pub async fn find_by_id(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let transactions = state
        .lending
        .find_by_transaction_id(&id)
        .await
        .map_err(domain_error_response)?;

    Ok(Json(json!(transactions)))
}

/// Borrower name search, case-insensitive substring
#[utoipa::path(
    post,
    path = "/api/manage-assets/find-asset",
    request_body = FindByNameRequest,
    responses(
        (status = 200, description = "Transactions of matching borrowers", body = [LendingTransaction]),
        (status = 400, description = "Empty name")
    )
)]
pub async fn find_by_name(
    State(state): State<AppState>,
    Json(payload): Json<FindByNameRequest>,
) -> ApiResult {
    let transactions = state
        .lending
        .find_transaction_by_name(&payload.name)
        .await
        .map_err(domain_error_response)?;

    Ok(Json(json!(transactions)))
}

#[utoipa::path(
    get,
    path = "/api/manage-assets/download/list-assets",
    responses(
        (status = 200, description = "CSV export of all transaction headers", body = String, content_type = "text/csv")
    )
)]
pub async fn download_list(State(state): State<AppState>) -> Response {
    match state.lending.download_assets().await {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("text/csv")),
                (
                    header::CONTENT_DISPOSITION,
                    HeaderValue::from_static("attachment; filename=\"list-assets.csv\""),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => domain_error_response(e).into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/manage-assets/{id}/return",
    params(("id" = String, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction returned", body = LendingTransaction),
        (status = 400, description = "Already returned"),
        (status = 404, description = "Unknown transaction")
    ),
    security(("bearer" = []))
)]
pub async fn return_transaction(
    State(state): State<AppState>,
    _claims: BorrowerClaims,
    Path(id): Path<String>,
) -> ApiResult {
    let transaction = state
        .lending
        .return_transaction(&id)
        .await
        .map_err(domain_error_response)?;

    Ok(Json(json!(transaction)))
}
