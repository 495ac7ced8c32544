use std::sync::Arc;

use anyhow::Context;

use staybook_auth::Hs256TokenValidator;
use staybook_infra::config::AuthServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    staybook_observability::init("staybook-auth-service");

    let config = AuthServiceConfig::from_env().context("invalid auth service configuration")?;
    if !config.jwt_secret_from_env {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let validator = Arc::new(Hs256TokenValidator::new(config.jwt_secret.as_bytes()));
    let app = staybook_auth_service::build_app(validator);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await
        .context("server error")?;

    Ok(())
}
