// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{analyze_image_handler, echo_handler, health_handler, index_handler};
use super::middleware::{cors_layer, request_id_layers};
use crate::config::AppConfig;
use crate::error::Result;
use crate::openai::VisionClient;
use crate::relay::Relay;
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

pub fn create_router(config: AppConfig, client: VisionClient) -> Result<Router> {
    let relay = Relay::new(
        client.with_log_sanitizing(config.logging.sanitize_tokens),
        config.image.clone(),
    );
    let body_limit = config.server.max_body_bytes;

    let state = AppState {
        relay: Arc::new(relay),
    };

    let (set_request_id, propagate_request_id) = request_id_layers();

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/echo", post(echo_handler))
        .route("/analyze-image", post(analyze_image_handler))
        // Uploads and base64 bodies are bounded by the configured limit
        // instead of axum's 2MB default; handlers turn a breach into a 413
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}
