//! Request gate: the per-request guard in front of every protected route.
//!
//! Extracts the bearer access token, resolves it through the session engine,
//! and attaches the subject to the request. On any failure the request is
//! short-circuited; downstream handlers never run.

use axum::{
    extract::{Extension, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use super::handlers::{error_response, extract_bearer_token};
use crate::session::SessionEngine;

/// Subject resolved by the gate, available to downstream handlers via
/// request extensions.
#[derive(Debug, Clone, Copy)]
pub struct Subject(pub Uuid);

pub async fn require_session(
    engine: Extension<Arc<SessionEngine>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(request.headers()) else {
        return (StatusCode::UNAUTHORIZED, "Missing token".to_string()).into_response();
    };

    match engine.authenticate(&token).await {
        Ok(user_id) => {
            request.extensions_mut().insert(Subject(user_id));
            next.run(request).await
        }
        Err(err) => error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth;
    use crate::session::{password, SessionConfig};
    use crate::store::{CredentialStore, MemoryStore};
    use crate::token::TokenCodec;
    use anyhow::{Context, Result};
    use axum::{body::Body, http::Request as HttpRequest, middleware, routing::get, Router};
    use secrecy::SecretString;
    use tower::ServiceExt;

    async fn app() -> Result<(Router, Arc<SessionEngine>)> {
        let store = Arc::new(MemoryStore::new());
        let hash = password::hash_password("longenough")?;
        store.insert_account("u1@example.com", &hash).await?;

        let codec = TokenCodec::new(&SecretString::from("gate-test-secret".to_string()))?;
        let engine = Arc::new(SessionEngine::new(store, codec, SessionConfig::new()));

        let router = Router::new()
            .route("/auth/me", get(auth::me))
            .route_layer(middleware::from_fn(require_session))
            .layer(Extension(engine.clone()));
        Ok((router, engine))
    }

    #[tokio::test]
    async fn gate_rejects_missing_token() -> Result<()> {
        let (router, _engine) = app().await?;
        let response = router
            .oneshot(HttpRequest::get("/auth/me").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn gate_rejects_garbage_token() -> Result<()> {
        let (router, _engine) = app().await?;
        let response = router
            .oneshot(
                HttpRequest::get("/auth/me")
                    .header("authorization", "Bearer garbage")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn gate_attaches_subject_for_valid_session() -> Result<()> {
        let (router, engine) = app().await?;
        let (account, pair) = engine.login("u1@example.com", "longenough").await?;

        let response = router
            .oneshot(
                HttpRequest::get("/auth/me")
                    .header("authorization", format!("Bearer {}", pair.access_token))
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        let user_id = body
            .get("user_id")
            .and_then(serde_json::Value::as_str)
            .context("missing user_id")?;
        assert_eq!(user_id, account.id.to_string());
        Ok(())
    }

    #[tokio::test]
    async fn gate_reports_logged_out_after_logout() -> Result<()> {
        let (router, engine) = app().await?;
        let (_, pair) = engine.login("u1@example.com", "longenough").await?;
        engine.logout(&pair.access_token).await?;

        let response = router
            .oneshot(
                HttpRequest::get("/auth/me")
                    .header("authorization", format!("Bearer {}", pair.access_token))
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(
            body.get("error").and_then(serde_json::Value::as_str),
            Some("logged_out")
        );
        Ok(())
    }
}
