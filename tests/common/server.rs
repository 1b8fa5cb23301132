//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own database.

use super::push::ScriptedPushTransport;
use notifications_server::push::{PushDispatcher, PushSettings, SubscriptionRegistry};
use notifications_server::server::server::make_app;
use notifications_server::server::{RequestsLoggingLevel, ServerConfig};
use notifications_server::store::NotificationStore;
use notifications_server::SqliteNotificationStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

const SERVER_READY_TIMEOUT_MS: u64 = 5000;
const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;

/// Test server instance with an isolated database
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Store handle for direct database access in tests
    pub store: Arc<dyn NotificationStore>,

    /// Scripted transport, present when spawned with push enabled
    pub transport: Option<Arc<ScriptedPushTransport>>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a test server without push delivery configured.
    pub async fn spawn() -> Self {
        Self::spawn_inner(None).await
    }

    /// Spawns a test server with a scripted push transport.
    pub async fn spawn_with_push(settings: PushSettings) -> Self {
        let transport = Arc::new(ScriptedPushTransport::new());
        Self::spawn_inner(Some((transport, settings))).await
    }

    async fn spawn_inner(push: Option<(Arc<ScriptedPushTransport>, PushSettings)>) -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_db_dir.path().join("notifications.db");

        let store: Arc<dyn NotificationStore> = Arc::new(
            SqliteNotificationStore::new(&db_path).expect("Failed to open notification store"),
        );
        let store_for_test = store.clone();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
        };

        let transport = push.as_ref().map(|(transport, _)| transport.clone());
        let push_dispatcher = push.map(|(transport, settings)| {
            let registry = SubscriptionRegistry::new(store.clone());
            Arc::new(PushDispatcher::new(
                registry,
                transport as Arc<dyn notifications_server::push::PushTransport>,
                settings,
            ))
        });

        let app = make_app(config, store, push_dispatcher);

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            store: store_for_test,
            transport,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the /healthz endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/healthz", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
