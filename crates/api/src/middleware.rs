//! Request authorization gate.
//!
//! `auth_middleware` wraps privileged routes: it pulls the bearer token from
//! the request, makes exactly one verification call, and only then hands the
//! request to `next` with a [`CallerContext`] attached. Every failure is the
//! same 401; the caller never learns whether the token was bad or the
//! authority was down.

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use staybook_auth::TokenVerifier;

use crate::app::errors;
use crate::context::CallerContext;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AuthState {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(req.headers()).map(str::to_owned) else {
        return errors::unauthenticated("Token is missing!");
    };

    match state.verifier.verify(&token).await {
        Ok(identity) => {
            req.extensions_mut().insert(CallerContext::new(identity));
            next.run(req).await
        }
        Err(e) => {
            tracing::info!(error = %e, path = %req.uri().path(), "token verification failed");
            errors::unauthenticated("Token is invalid!")
        }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;

    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        return None;
    }

    Some(token)
}
