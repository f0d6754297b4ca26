//! Casting agency HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, storage and the token authorizer into the router,
//! then serves the API and the metrics listener until Ctrl-C.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use casting_api::app::{AppState, build_router};
use casting_api::config::{self, ServiceConfig};
use casting_api::observability;
use casting_api::store::{CastingStore, memory::InMemoryStore, postgres::PostgresStore};
use casting_authz::{Authorizer, CachingKeyProvider, HttpKeyProvider, KeyProvider, TokenVerifier};
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env_or_yaml().context("casting api config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: ServiceConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("casting-api");
    let state = build_state(config.clone()).await?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state.clone());

    let addr = config.bind_addr;
    tracing::info!(
        %addr,
        storage = state.store.backend_name(),
        auth_configured = state.authorizer.verifier().config().is_configured(),
        "casting api listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

async fn build_state(config: ServiceConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn CastingStore> = match config.storage {
        config::StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        config::StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(PostgresStore::connect(pg).await?)
        }
    };

    let auth = &config.auth;
    if !auth.verifier_config().is_configured() {
        tracing::warn!("AUTH0_DOMAIN or API_AUDIENCE unset; protected routes will answer 500");
    }
    let mut http = HttpKeyProvider::new(auth.jwks_timeout()).context("jwks http client")?;
    if let Some(url) = &auth.jwks_url {
        http = http.with_jwks_url(url.clone());
    }
    let provider: Arc<dyn KeyProvider> = match auth.jwks_cache_ttl() {
        Some(ttl) => Arc::new(CachingKeyProvider::new(http, ttl)),
        None => Arc::new(http),
    };

    Ok(AppState {
        store,
        authorizer: Authorizer::new(TokenVerifier::new(auth.verifier_config(), provider)),
    })
}
