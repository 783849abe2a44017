//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use floorwatch::database::SqliteStore;
use floorwatch::server::{build_router, AppState};
use floorwatch::sync::SchedulerHandle;

/// Create an in-memory store for testing
pub async fn create_test_store() -> Arc<SqliteStore> {
    Arc::new(
        SqliteStore::in_memory()
            .await
            .expect("Failed to create test store"),
    )
}

/// Create a test application state with no running scheduler
pub async fn create_test_state() -> AppState<SqliteStore> {
    AppState {
        store: create_test_store().await,
        sync: SchedulerHandle::disconnected(),
    }
}

/// Create a test application state over an existing store and handle
pub fn create_test_state_with(
    store: Arc<SqliteStore>,
    sync: SchedulerHandle,
) -> AppState<SqliteStore> {
    AppState { store, sync }
}

/// Run a test server in the background and return the address
///
/// The server shuts down when the returned sender is used or dropped.
pub async fn run_test_server(
    state: AppState<SqliteStore>,
) -> (std::net::SocketAddr, tokio::sync::oneshot::Sender<()>) {
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local address");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let app = build_router(state);

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .expect("Server error");
    });

    // Give the server a moment to start (100ms is sufficient for slow CI systems)
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    (addr, shutdown_tx)
}
