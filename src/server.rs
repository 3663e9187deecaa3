use crate::store::FlowStore;
use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Extension, Router,
};
use hyper::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info};

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "flow_scraper",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Full ordered list of stored readings. Surfaces only successfully
/// completed cycles; an empty store is an empty list, not an error.
async fn water_flow(Extension(store): Extension<Arc<dyn FlowStore>>) -> impl IntoResponse {
    match store.all_readings().await {
        Ok(readings) => Json(readings).into_response(),
        Err(e) => {
            error!("failed to load readings: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to retrieve water flow data" })),
            )
                .into_response()
        }
    }
}

pub fn create_server(store: Arc<dyn FlowStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/water-flow", get(water_flow))
        // Chart frontend; API routes above take precedence
        .fallback_service(ServeDir::new("public"))
        .layer(Extension(store))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(store: Arc<dyn FlowStore>, port: u16) -> hyper::Result<()> {
    let app = create_server(store);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("HTTP server running on http://localhost:{port}");

    Server::bind(&addr).serve(app.into_make_service()).await
}
