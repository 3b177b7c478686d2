//! Dashboard versioning HTTP routes
//!
//! Endpoints for export, version listing, the current pointer, and rollback.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::core::Orchestrator;
use crate::domain::ExportOutcome;

// ==================
// Shared State
// ==================

/// Orchestrator shared across handlers; the lock keeps flows from interleaving
#[derive(Clone)]
pub struct ApiState {
    orchestrator: Arc<Mutex<Orchestrator>>,
}

impl ApiState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(Mutex::new(orchestrator)),
        }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionEntry {
    pub hash: String,
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentResponse {
    pub current: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RollbackRequest {
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RollbackResponse {
    pub status: String,
    pub message: String,
    pub current: Option<String>,
}

type ApiError = (StatusCode, Json<StatusResponse>);

fn internal_error(err: impl std::fmt::Display) -> ApiError {
    error!(error = %err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(StatusResponse::error(err.to_string())),
    )
}

// ==================
// Routes
// ==================

/// Create the `/api` routes
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/export", post(export_handler))
        .route("/versions", get(versions_handler))
        .route("/current", get(current_handler))
        .route("/rollback", post(rollback_handler))
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn export_handler(
    State(state): State<ApiState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let orchestrator = state.orchestrator.lock().await;
    let outcome = orchestrator.export().await.map_err(internal_error)?;

    let status = match outcome {
        ExportOutcome::Exported { .. } => "exported",
        ExportOutcome::NoChange { .. } => "no_change",
    };

    Ok(Json(StatusResponse {
        status: status.to_string(),
        message: outcome.message(),
    }))
}

async fn versions_handler(
    State(state): State<ApiState>,
) -> Result<Json<Vec<VersionEntry>>, ApiError> {
    let orchestrator = state.orchestrator.lock().await;
    let versions = orchestrator.list_versions().await.map_err(internal_error)?;

    Ok(Json(
        versions
            .iter()
            .map(|rev| VersionEntry {
                hash: rev.id.clone(),
                label: rev.label(),
            })
            .collect(),
    ))
}

async fn current_handler(
    State(state): State<ApiState>,
) -> Result<Json<CurrentResponse>, ApiError> {
    let orchestrator = state.orchestrator.lock().await;
    let current = orchestrator.current().map_err(internal_error)?;

    Ok(Json(CurrentResponse { current }))
}

async fn rollback_handler(
    State(state): State<ApiState>,
    body: Bytes,
) -> (StatusCode, Json<RollbackResponse>) {
    // An unparseable body counts as a missing version
    let request: RollbackRequest = serde_json::from_slice(&body).unwrap_or_default();
    let orchestrator = state.orchestrator.lock().await;
    let previous = orchestrator.current().unwrap_or_else(|e| {
        warn!(error = %e, "cannot read current version");
        None
    });

    let version = match request.version.as_deref().map(str::trim) {
        Some(version) if !version.is_empty() => version,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(RollbackResponse {
                    status: "error".to_string(),
                    message: "Version is required".to_string(),
                    current: previous,
                }),
            );
        }
    };

    match orchestrator.rollback(version).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(RollbackResponse {
                status: "success".to_string(),
                message: format!("Rolled back to {}", version),
                current: Some(outcome.current),
            }),
        ),
        Err(err) => {
            error!(stage = ?err.stage, error = %err, "rollback failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RollbackResponse {
                    status: "error".to_string(),
                    message: err.to_string(),
                    current: previous,
                }),
            )
        }
    }
}
