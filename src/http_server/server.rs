//! # HTTP Server
//!
//! Combines the health check and `/api` routes behind CORS and request tracing.

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::routes::{api_routes, ApiState};
use crate::config::ServerSettings;

/// HTTP server for the dashboard versioning API
pub struct HttpServer {
    settings: ServerSettings,
    router: Router,
}

impl HttpServer {
    pub fn new(settings: ServerSettings, state: ApiState) -> Self {
        Self {
            settings,
            router: build_router(state),
        }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.settings.host, self.settings.port)
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the process exits
    pub async fn start(self) -> std::io::Result<()> {
        let addr = self.socket_addr();
        let listener = TcpListener::bind(&addr).await?;

        info!(%addr, "dashver API listening");
        axum::serve(listener, self.router).await
    }
}

/// Build the combined router with all endpoints
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
