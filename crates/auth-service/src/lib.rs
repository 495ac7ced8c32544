//! Token-verification authority.
//!
//! Holds the HS256 secret and answers one question over HTTP: who does this
//! bearer token belong to, and is it still valid.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use staybook_auth::Hs256TokenValidator;
use staybook_infra::external::VERIFY_TOKEN_PATH;

#[derive(Clone)]
pub struct AuthServiceState {
    pub validator: Arc<Hs256TokenValidator>,
}

#[derive(Debug, Serialize)]
pub struct VerifyTokenResponse {
    pub user_id: String,
    pub expires_at: String,
}

pub fn build_app(validator: Arc<Hs256TokenValidator>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(VERIFY_TOKEN_PATH, get(verify_token))
        .with_state(AuthServiceState { validator })
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn verify_token(State(state): State<AuthServiceState>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return unauthenticated("Token is missing!");
    };

    let claims = match state.validator.validate(token, Utc::now()) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::info!(error = %e, "token rejected");
            return unauthenticated("Token is invalid!");
        }
    };

    let expires_at = claims
        .expires_at()
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default();

    (
        StatusCode::OK,
        Json(VerifyTokenResponse {
            user_id: claims.sub.into_inner(),
            expires_at,
        }),
    )
        .into_response()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

fn unauthenticated(message: &'static str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthenticated",
            "message": message,
        })),
    )
        .into_response()
}
