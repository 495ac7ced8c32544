use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use staybook_auth::{Hs256TokenIssuer, Hs256TokenValidator};
use staybook_core::UserId;

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(secret: &str) -> Self {
        let app = staybook_auth_service::build_app(Arc::new(Hs256TokenValidator::new(secret.as_bytes())));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn verify_url(&self) -> String {
        format!("{}/api/auth/verify-token/", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint(user: &str, ttl: ChronoDuration) -> String {
    Hs256TokenIssuer::new(SECRET.as_bytes())
        .issue(UserId::parse(user).unwrap(), Utc::now(), ttl)
        .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn(SECRET).await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn valid_token_resolves_to_user_id() {
    let srv = TestServer::spawn(SECRET).await;
    let token = mint("u1", ChronoDuration::minutes(10));

    let res = reqwest::Client::new()
        .get(srv.verify_url())
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user_id"], "u1");
    assert!(body["expires_at"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn missing_token_is_401() {
    let srv = TestServer::spawn(SECRET).await;
    let res = reqwest::get(srv.verify_url()).await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Token is missing!");
}

#[tokio::test]
async fn expired_token_is_401() {
    let srv = TestServer::spawn(SECRET).await;
    let token = mint("u1", ChronoDuration::seconds(-60));

    let res = reqwest::Client::new()
        .get(srv.verify_url())
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_another_key_is_401() {
    let srv = TestServer::spawn(SECRET).await;
    let now = Utc::now().timestamp();
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({ "sub": "u1", "iat": now, "exp": now + 600 }),
        &EncodingKey::from_secret(b"someone-else"),
    )
    .unwrap();

    let res = reqwest::Client::new()
        .get(srv.verify_url())
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_401() {
    let srv = TestServer::spawn(SECRET).await;
    let res = reqwest::Client::new()
        .get(srv.verify_url())
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
