//! HTTP server components for floorwatch
//!
//! This module provides the HTTP server infrastructure including:
//! - Router configuration and route handlers
//! - Server lifecycle management with graceful shutdown

pub mod router;

pub use router::{build_router, AppState, HealthResponse};

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::database::RecordStore;

/// HTTP server for floorwatch
///
/// Manages the axum server lifecycle, including:
/// - Binding to the configured address
/// - Applying middleware layers
/// - Graceful shutdown handling
pub struct Server<S: RecordStore + 'static> {
    config: ServerConfig,
    state: AppState<S>,
}

impl<S: RecordStore + 'static> Server<S> {
    /// Create a new server instance
    pub fn new(config: ServerConfig, state: AppState<S>) -> Self {
        Self { config, state }
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.config.host.parse().unwrap_or([0, 0, 0, 0].into()),
            self.config.port,
        )
    }

    /// Run the server until shutdown signal is received
    ///
    /// # Arguments
    ///
    /// * `shutdown` - Future that resolves when the server should shut down
    ///
    /// # Returns
    ///
    /// Ok(()) if server shuts down gracefully, Err if there was an error
    pub async fn run(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let addr = self.bind_addr();
        let app = build_router(self.state);

        // Apply middleware layers
        let app = app
            .layer(tower_http::trace::TraceLayer::new_for_http())
            .layer(tower_http::compression::CompressionLayer::new());

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to address
    #[error("Failed to bind to address: {0}")]
    Bind(String),

    /// Failed to serve requests
    #[error("Server error: {0}")]
    Serve(String),
}
