//! Shared handler helpers: bearer extraction, input validation, and the
//! error-body mapping every auth endpoint uses.

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::session::AuthError;

pub(crate) mod auth;
pub(crate) mod health;
pub(crate) mod root;

/// Error payload with a machine-readable reason code, so clients can decide
/// between prompting a fresh login and retrying after a refresh.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

pub(crate) fn error_response(err: &AuthError) -> Response {
    let status = match err {
        AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNAUTHORIZED,
    };
    let body = ErrorBody {
        error: err.reason().to_string(),
        message: err.to_string(),
    };
    (status, Json(body)).into_response()
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(crate) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

pub(crate) fn valid_password(password: &str) -> bool {
    password.len() >= 8
}
