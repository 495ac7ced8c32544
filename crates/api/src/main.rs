use std::sync::Arc;

use anyhow::Context;

use staybook_api::app::{self, services};
use staybook_infra::config::ListingsConfig;
use staybook_infra::listing_store::ListingStore;
use staybook_infra::external::RemoteTokenVerifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    staybook_observability::init("staybook-listings");

    let config = ListingsConfig::from_env().context("invalid listings configuration")?;

    let store = services::build_store(&config.store)
        .await
        .context("failed to construct listing store")?;
    store
        .health_check()
        .await
        .context("listing store health check failed")?;

    if let Some(path) = &config.seed_path {
        let inserted = services::seed_from_file(store.as_ref(), path)
            .await
            .with_context(|| format!("failed to seed listings from {}", path.display()))?;
        tracing::info!(inserted, path = %path.display(), "seeded listings");
    }

    let verifier = RemoteTokenVerifier::new(
        &config.auth_service_url,
        config.verify_timeout,
        config.connect_timeout,
    )
    .context("failed to build verifier client")?;
    tracing::info!(verify_url = verifier.verify_url(), "delegating token verification");

    let services = Arc::new(services::AppServices::new(store.clone()));
    let router = app::build_app(services, Arc::new(verifier), &config.cors_allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
