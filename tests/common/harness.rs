//! Test server harness.

use ragdock::gateway::{HandlerState, create_router_with_state};
use ragdock::models::ModelRegistry;
use ragdock::vectordb::StoreBackend;
use ragdock::ServiceContext;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const STARTUP_WAIT_TIMEOUT_SECS: u64 = 5;
const STARTUP_POLL_INTERVAL_MS: u64 = 50;

pub const MODEL_LARGE: &str = "mxbai-large";
pub const MODEL_SMALL: &str = "all-minilm";

#[derive(Debug, Clone)]
pub struct TestServerConfig {
    pub port: u16,
    /// Snapshot file for the in-process engine. Loaded on start, written on shutdown.
    pub snapshot_path: Option<PathBuf>,
    pub with_reranker: bool,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            port: 0,
            snapshot_path: None,
            with_reranker: true,
        }
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    server_handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    store: StoreBackend,
    snapshot_path: Option<PathBuf>,
    _temp_dir: TempDir,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stops the server and writes the snapshot, like the binary does on SIGTERM.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
        self.store
            .persist(self.snapshot_path.as_deref())
            .expect("snapshot should be written");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn find_available_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    Ok(addr.port())
}

pub async fn wait_for_server_ready(
    addr: SocketAddr,
    timeout: Duration,
    interval: Duration,
) -> Result<(), ServerStartupError> {
    let start = std::time::Instant::now();

    loop {
        if start.elapsed() > timeout {
            return Err(ServerStartupError::Timeout);
        }

        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(_) => {
                tokio::time::sleep(interval).await;
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerStartupError {
    #[error("Server failed to start within timeout")]
    Timeout,
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Server startup failed: {0}")]
    StartupFailed(String),
}

/// Writes a stub-only model manifest into `dir`.
pub fn write_manifest(dir: &TempDir, with_reranker: bool) -> std::io::Result<PathBuf> {
    let mut manifest = serde_json::json!({
        "models": [
            {"id": MODEL_LARGE, "stub": true, "dimension": 1024},
            {"id": MODEL_SMALL, "stub": true, "dimension": 384}
        ]
    });
    if with_reranker {
        manifest["reranker"] = serde_json::json!({"stub": true});
    }

    let path = dir.path().join("models.json");
    std::fs::write(&path, manifest.to_string())?;
    Ok(path)
}

/// Spawns a server on an ephemeral port with stub models and the in-process engine.
///
/// Models are loaded through a manifest file, the same way the binary loads them.
pub async fn spawn_test_server(config: TestServerConfig) -> Result<TestServer, ServerStartupError> {
    let port = if config.port == 0 {
        find_available_port().await?
    } else {
        config.port
    };

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    let temp_dir = TempDir::new()?;
    let manifest = write_manifest(&temp_dir, config.with_reranker)?;
    let models = ModelRegistry::load(&manifest, None)
        .map_err(|e| ServerStartupError::StartupFailed(e.to_string()))?;

    let store = StoreBackend::from_config(None, config.snapshot_path.as_deref())
        .await
        .map_err(|e| ServerStartupError::StartupFailed(e.to_string()))?;

    let ctx = ServiceContext::new(Arc::new(models), store.clone());
    let app = create_router_with_state(HandlerState::new(ctx));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    wait_for_server_ready(
        local_addr,
        Duration::from_secs(STARTUP_WAIT_TIMEOUT_SECS),
        Duration::from_millis(STARTUP_POLL_INTERVAL_MS),
    )
    .await?;

    Ok(TestServer {
        addr: local_addr,
        server_handle: Some(server_handle),
        shutdown_tx: Some(shutdown_tx),
        store,
        snapshot_path: config.snapshot_path,
        _temp_dir: temp_dir,
    })
}
