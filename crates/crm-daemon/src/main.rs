//! crm-daemon entry point.
//!
//! Sets up tracing, loads configuration, picks the storage backend, wires
//! middleware, and starts the HTTP server. Route handlers live in
//! `routes.rs`; shared state lives in `state.rs`.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use crm_config::{CrmConfig, StorageBackend};
use crm_daemon::{routes, state};
use crm_db::{MemoryStore, PgStore, Store};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let loaded = crm_config::load_from_env()?;
    let cfg = loaded.settings()?;
    info!(config_hash = %loaded.config_hash, "config loaded");

    let store = open_store(&cfg).await?;
    let shared = Arc::new(state::AppState::from_config(store, &cfg)?);

    state::spawn_heartbeat(
        shared.bus.clone(),
        Duration::from_secs(cfg.server.heartbeat_secs),
    );

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(routes::cors_layer());

    let addr = cfg.server.socket_addr()?;
    info!("crm-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn open_store(cfg: &CrmConfig) -> anyhow::Result<Arc<dyn Store>> {
    match cfg.storage.backend {
        StorageBackend::Memory => {
            warn!("storage.backend=memory: data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let pool = crm_db::connect_from_env(
                &cfg.storage.database_url_env,
                cfg.storage.max_connections,
            )
            .await?;
            if cfg.storage.run_migrations {
                crm_db::migrate(&pool).await?;
                info!("migrations applied");
            }
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
