//! Auth endpoints: register, login, refresh rotation, and logout.
//!
//! Access tokens ride the `Authorization: Bearer` header; refresh tokens use
//! the same header on the `/auth/refresh` endpoint. Login intentionally
//! replaces any prior sessions for the account.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::{
    error_response, extract_bearer_token, normalize_email, valid_email, valid_password,
};
use crate::api::gate::Subject;
use crate::session::{password, AuthError, SessionEngine};
use crate::store::SignupOutcome;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub user_id: String,
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MeResponse {
    pub user_id: String,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 409, description = "Email already registered", body = String)
    ),
    tag = "auth"
)]
pub async fn register(
    engine: Extension<Arc<SessionEngine>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }
    if !valid_password(&request.password) {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
    }

    let password_hash = match password::hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
                .into_response();
        }
    };

    match engine.store().insert_account(&email, &password_hash).await {
        Ok(SignupOutcome::Created(user_id)) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                user_id: user_id.to_string(),
                email,
            }),
        )
            .into_response(),
        Ok(SignupOutcome::Conflict) => {
            (StatusCode::CONFLICT, "User already exists".to_string()).into_response()
        }
        Err(err) => {
            error!("Failed to insert account: {err}");
            error_response(&AuthError::from(err))
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 401, description = "Invalid email or password", body = super::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    engine: Extension<Arc<SessionEngine>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    match engine.login(&email, &request.password).await {
        Ok((account, pair)) => (
            StatusCode::OK,
            Json(LoginResponse {
                user_id: account.id.to_string(),
                email: account.email,
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            }),
        )
            .into_response(),
        Err(err) => {
            if let AuthError::StoreUnavailable(ref inner) = err {
                error!("Login failed: {inner}");
            }
            error_response(&err)
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Tokens rotated", body = TokenPairResponse),
        (status = 401, description = "Expired, invalid, or reused refresh token", body = super::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    engine: Extension<Arc<SessionEngine>>,
) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "Missing token".to_string()).into_response();
    };

    match engine.rotate(&token).await {
        Ok(pair) => (
            StatusCode::OK,
            Json(TokenPairResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            }),
        )
            .into_response(),
        Err(err) => {
            if let AuthError::StoreUnavailable(ref inner) = err {
                error!("Refresh failed: {inner}");
            }
            error_response(&err)
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "All sessions revoked", body = String),
        (status = 401, description = "Expired or invalid access token", body = super::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    engine: Extension<Arc<SessionEngine>>,
) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "Missing token".to_string()).into_response();
    };

    match engine.logout(&token).await {
        Ok(()) => (StatusCode::OK, "Logged out successfully".to_string()).into_response(),
        Err(err) => {
            if let AuthError::StoreUnavailable(ref inner) = err {
                error!("Logout failed: {inner}");
            }
            error_response(&err)
        }
    }
}

/// Who am I, as resolved by the request gate.
///
/// Registered outside the documented router because it exists to prove the
/// gate end to end; the gate itself guards any protected route the same way.
pub async fn me(subject: Extension<Subject>) -> impl IntoResponse {
    Json(MeResponse {
        user_id: subject.0 .0.to_string(),
    })
}
