//! Ragdock HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use ragdock::config::{Config, DEFAULT_PORT};
use ragdock::gateway::{HandlerState, create_router_with_state};
use ragdock::models::ModelRegistry;
use ragdock::vectordb::StoreBackend;
use ragdock::{ServiceContext, VectorStore};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        "Ragdock starting"
    );

    let manifest = config
        .model_manifest
        .as_deref()
        .context("model manifest path missing after validation")?;
    let models = ModelRegistry::load(manifest, config.reranker_path.as_deref())
        .with_context(|| format!("failed to load models from {}", manifest.display()))?;

    tracing::info!(
        models = ?models.model_ids(),
        reranker = ?models.reranker_id(),
        "Model registry ready"
    );

    let store = StoreBackend::from_config(
        config.qdrant_url.as_deref(),
        config.storage_path.as_deref(),
    )
    .await?;
    store.health_check().await?;
    tracing::info!(engine = store.engine(), "Storage engine ready");

    let ctx = ServiceContext::new(Arc::new(models), store.clone());
    let app = create_router_with_state(HandlerState::new(ctx));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(path) = config.storage_path.as_deref() {
        tracing::info!(path = %path.display(), "Writing storage snapshot");
        if let Err(e) = store.persist(Some(path)) {
            tracing::error!(error = %e, "Failed to write storage snapshot");
        }
    }

    tracing::info!("Ragdock shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var(Config::ENV_PORT)
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let url = format!("http://127.0.0.1:{}/health", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
