use axum::{extract::State, http::StatusCode, Json};
use sea_orm::*;
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use super::domain_error_response;
use crate::domain::Rejection;
use crate::infrastructure::auth::{hash_password, password_matches};
use crate::infrastructure::AppState;
use crate::models::user::{self, Entity as User};

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct OtpLoginRequest {
    email: String,
    otp: u32,
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Invalid credentials" })),
    )
}

fn email_taken() -> (StatusCode, Json<Value>) {
    (
        StatusCode::CONFLICT,
        Json(json!({ "error": "email already registered" })),
    )
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}

async fn find_active_user(
    db: &DatabaseConnection,
    email: &str,
) -> Result<user::Model, (StatusCode, Json<Value>)> {
    match User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(internal)?
    {
        Some(u) if u.is_active => Ok(u),
        _ => {
            tracing::warn!("Login for unknown or inactive account: {}", email);
            Err(unauthorized())
        }
    }
}

/// Create an active borrower account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Missing email, password or name"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let email = payload.email.trim();
    let name = payload.name.trim();
    let rejection = if email.is_empty() {
        Some(Rejection::EmptyEmail)
    } else if payload.password.is_empty() {
        Some(Rejection::EmptyPassword)
    } else if name.is_empty() {
        Some(Rejection::EmptyBorrowerName)
    } else {
        None
    };
    if let Some(rejection) = rejection {
        return Err(domain_error_response(rejection.into()));
    }

    let existing = User::find()
        .filter(user::Column::Email.eq(email))
        .one(state.db())
        .await
        .map_err(internal)?;
    if existing.is_some() {
        tracing::warn!("Registration for existing email: {}", email);
        return Err(email_taken());
    }

    let password = hash_password(&payload.password).map_err(domain_error_response)?;
    let id = uuid::Uuid::new_v4().to_string();
    let account = user::ActiveModel {
        id: Set(id.clone()),
        email: Set(email.to_owned()),
        password: Set(password),
        name: Set(name.to_owned()),
        is_active: Set(true),
    };

    // Losing a race with a concurrent registration trips the UNIQUE constraint
    if let Err(e) = account.insert(state.db()).await {
        return Err(match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => email_taken(),
            _ => internal(e),
        });
    }

    tracing::info!("Registered borrower {}", id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "registered", "id": id })),
    ))
}

/// First factor: password check, then a one-time code is issued for the account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "One-time code issued"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    tracing::info!("Login attempt for: {}", payload.email);

    let user = find_active_user(state.db(), &payload.email).await?;

    if !password_matches(&payload.password, &user.password) {
        tracing::warn!("Password verification failed for: {}", user.email);
        return Err(unauthorized());
    }

    let code = state.otp_store.issue(&user.email);
    tracing::debug!("One-time code issued for {}", user.email);
    tracing::trace!("One-time code for {}: {:06}", user.email, code);
    Ok(Json(json!({ "message": "otp sent" })))
}

/// Second factor: redeem the one-time code for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login-otp",
    request_body = OtpLoginRequest,
    responses(
        (status = 200, description = "Bearer token issued"),
        (status = 401, description = "Invalid or expired code")
    )
)]
pub async fn login_otp(
    State(state): State<AppState>,
    Json(payload): Json<OtpLoginRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if !state.otp_store.verify(&payload.email, payload.otp) {
        tracing::warn!("Invalid one-time code for: {}", payload.email);
        return Err(unauthorized());
    }

    let user = find_active_user(state.db(), &payload.email).await?;
    let token = state
        .tokens
        .issue(&user.id, &user.email)
        .map_err(domain_error_response)?;

    tracing::info!("User {} logged in", user.id);
    Ok(Json(json!({ "token": token })))
}
