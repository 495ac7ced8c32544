//! Client for the authentication authority's token verification endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use staybook_auth::{CallerIdentity, TokenVerifier, VerifyError};
use staybook_core::WireUserId;

/// Path of the verification endpoint, relative to the authority's base URL.
pub const VERIFY_TOKEN_PATH: &str = "/api/auth/verify-token/";

/// Verifies bearer tokens by asking the authentication authority.
///
/// One GET per call with the token forwarded as-is. No retries and no cache:
/// every non-200 answer, timeout, connection failure or unparseable body is a
/// refusal.
#[derive(Debug, Clone)]
pub struct RemoteTokenVerifier {
    client: Client,
    verify_url: String,
}

impl RemoteTokenVerifier {
    pub fn new(base_url: &str, timeout: Duration, connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            verify_url: format!("{}{}", base_url.trim_end_matches('/'), VERIFY_TOKEN_PATH),
        }
    }

    pub fn verify_url(&self) -> &str {
        &self.verify_url
    }
}

/// The authority reports user ids as numbers or strings depending on its backend.
#[derive(Debug, Deserialize)]
struct VerifyTokenResponse {
    user_id: WireUserId,
}

#[async_trait]
impl TokenVerifier for RemoteTokenVerifier {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, VerifyError> {
        let resp = self
            .client
            .get(&self.verify_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| VerifyError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(VerifyError::Rejected(format!("authority answered {status}")));
        }

        let body: VerifyTokenResponse = resp
            .json()
            .await
            .map_err(|e| VerifyError::MalformedResponse(e.to_string()))?;

        let user_id = body
            .user_id
            .into_user_id()
            .map_err(|e| VerifyError::MalformedResponse(e.to_string()))?;

        Ok(CallerIdentity::new(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::get, Json, Router};
    use serde_json::json;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn verifier(base: &str) -> RemoteTokenVerifier {
        RemoteTokenVerifier::new(base, Duration::from_millis(300), Duration::from_millis(300)).unwrap()
    }

    #[tokio::test]
    async fn forwards_token_and_accepts_numeric_user_id() {
        let app = Router::new().route(
            VERIFY_TOKEN_PATH,
            get(|headers: HeaderMap| async move {
                let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
                if auth == Some("Bearer tok-123") {
                    (axum::http::StatusCode::OK, Json(json!({ "user_id": 7 })))
                } else {
                    (axum::http::StatusCode::UNAUTHORIZED, Json(json!({ "message": "no" })))
                }
            }),
        );
        let base = spawn(app).await;

        let identity = verifier(&base).verify("tok-123").await.unwrap();
        assert_eq!(identity.user_id().as_str(), "7");

        let err = verifier(&base).verify("other").await.unwrap_err();
        assert!(matches!(err, VerifyError::Rejected(_)));
    }

    #[tokio::test]
    async fn accepts_string_user_id_and_trailing_slash_base() {
        let app = Router::new().route(
            VERIFY_TOKEN_PATH,
            get(|| async { Json(json!({ "user_id": "u1", "expires_at": "2030-01-01T00:00:00Z" })) }),
        );
        let base = spawn(app).await;

        let identity = verifier(&format!("{base}/")).verify("t").await.unwrap();
        assert_eq!(identity.user_id().as_str(), "u1");
    }

    #[tokio::test]
    async fn malformed_success_body_is_refused() {
        let app = Router::new().route(VERIFY_TOKEN_PATH, get(|| async { Json(json!({ "ok": true })) }));
        let base = spawn(app).await;

        let err = verifier(&base).verify("t").await.unwrap_err();
        assert!(matches!(err, VerifyError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn slow_authority_times_out() {
        let app = Router::new().route(
            VERIFY_TOKEN_PATH,
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({ "user_id": "u1" }))
            }),
        );
        let base = spawn(app).await;

        let err = verifier(&base).verify("t").await.unwrap_err();
        assert!(matches!(err, VerifyError::Unavailable(_)));
    }

    #[tokio::test]
    async fn unreachable_authority_is_unavailable() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = verifier(&format!("http://{addr}")).verify("t").await.unwrap_err();
        assert!(matches!(err, VerifyError::Unavailable(_)));
    }
}
