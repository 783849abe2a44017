//! HTTP router for floorwatch
//!
//! This module defines the axum router that serves the record store and the
//! sync pipeline's operational endpoints:
//! - Health check
//! - Collection records CRUD (list, add, delete)
//! - Sync pass status and manual trigger

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::database::RecordStore;
use crate::error::StoreError;
use crate::models::NewCollectionRecord;
use crate::sync::{SchedulerHandle, TriggerOutcome};

/// Shared application state
pub struct AppState<S: RecordStore> {
    /// Record store
    pub store: Arc<S>,

    /// Handle to the sync scheduler
    pub sync: SchedulerHandle,
}

impl<S: RecordStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sync: self.sync.clone(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Build the main application router
///
/// # Arguments
///
/// * `state` - Application state containing the store and scheduler handle
///
/// # Returns
///
/// An axum Router configured with all endpoints
pub fn build_router<S: RecordStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/collections", get(list_collections_handler::<S>))
        .route("/api/collections", post(add_collection_handler::<S>))
        .route(
            "/api/collections/:id",
            delete(delete_collection_handler::<S>),
        )
        .route("/api/sync/status", get(sync_status_handler::<S>))
        .route("/api/sync/trigger", post(trigger_sync_handler::<S>))
        .with_state(state)
}

// =============================================================================
// Health Handler
// =============================================================================

/// Health check endpoint handler
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Collection Handlers
// =============================================================================

/// List all collection records
async fn list_collections_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    match state.store.list_all().await {
        Ok(collections) => (
            StatusCode::OK,
            Json(serde_json::json!({ "collections": collections })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list collections");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to list collections" })),
            )
        }
    }
}

/// Insert a new collection record
async fn add_collection_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Json(record): Json<NewCollectionRecord>,
) -> impl IntoResponse {
    if record.slug.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Slug must not be empty" })),
        );
    }
    if record.floor_price.is_some_and(|p| !p.is_finite() || p < 0.0) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Floor price must be a non-negative number" })),
        );
    }

    match state.store.insert(&record).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "id": id, "message": "Collection added" })),
        ),
        Err(StoreError::ConstraintViolation(_)) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "Collection already exists" })),
        ),
        Err(e) => {
            tracing::error!(error = %e, slug = %record.slug, "Failed to add collection");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to add collection" })),
            )
        }
    }
}

/// Delete a collection record by its handle
async fn delete_collection_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.store.delete_by_id(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Collection deleted" })),
        ),
        Err(StoreError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Collection not found" })),
        ),
        Err(e) => {
            tracing::error!(error = %e, record_id = id, "Failed to delete collection");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to delete collection" })),
            )
        }
    }
}

// =============================================================================
// Sync Handlers
// =============================================================================

/// Report the persisted pass status plus live scheduler state
async fn sync_status_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    match state.store.get_pass_status().await {
        Ok(status) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "last_pass_at": status.last_pass_at,
                "state": status.state,
                "error_message": status.error_message,
                "succeeded": status.succeeded,
                "failed": status.failed,
                "pass_in_progress": state.sync.pass_in_progress(),
                "skipped_firings": state.sync.skipped_firings(),
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read pass status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to read pass status" })),
            )
        }
    }
}

/// Request an immediate sync pass
async fn trigger_sync_handler<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    match state.sync.trigger_pass().await {
        Ok(TriggerOutcome::Started) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "message": "Sync pass started" })),
        ),
        Ok(TriggerOutcome::AlreadyRunning) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "A sync pass is already running" })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Sync trigger rejected");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "error": "Sync scheduler is not running" })),
            )
        }
    }
}
