//! TIL Shuffle session host entrypoint wiring the record store, REST, SSE and the
//! store supervisor.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use til_shuffle::{
    config::{AppConfig, StoreBackend},
    dao::record_store::{RecordStore, memory::InMemoryRecordStore},
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = build_store(&config)?;
    let app_state = AppState::new(config, store);
    info!(participant_id = %app_state.identity().participant_id(), "session identity ready");

    tokio::spawn(storage_supervisor::run(app_state.clone()));
    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    app_state.replace_poller(None).await;
    info!("server stopped");
    Ok(())
}

/// Pick the record store backend from the configuration.
///
/// Without a reachable URL for the HTTP backend the session falls back to the
/// process-local store, which only lets this one process play.
fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn RecordStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("using in-memory record store");
            Ok(Arc::new(InMemoryRecordStore::new()))
        }
        StoreBackend::Http => build_http_store(config),
    }
}

#[cfg(feature = "http-store")]
fn build_http_store(config: &AppConfig) -> anyhow::Result<Arc<dyn RecordStore>> {
    use til_shuffle::dao::record_store::http::{HttpRecordStore, HttpStoreConfig, HttpStoreError};

    match HttpStoreConfig::from_env(config.store.base_url.as_deref()) {
        Ok(http_config) => {
            info!(base_url = %http_config.base_url, "using HTTP record store");
            let store = HttpRecordStore::new(http_config).context("building record store client")?;
            Ok(Arc::new(store))
        }
        Err(HttpStoreError::MissingEnvVar { var }) => {
            warn!(var, "no record store URL configured; falling back to in-memory store");
            Ok(Arc::new(InMemoryRecordStore::new()))
        }
        Err(err) => Err(err).context("reading record store configuration"),
    }
}

#[cfg(not(feature = "http-store"))]
fn build_http_store(_config: &AppConfig) -> anyhow::Result<Arc<dyn RecordStore>> {
    warn!("built without the http-store feature; falling back to in-memory store");
    Ok(Arc::new(InMemoryRecordStore::new()))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for SIGTERM; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
