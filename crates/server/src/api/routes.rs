use axum::{
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::warn;

use super::{handlers, middleware::metrics_middleware, tickets};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Web UI static files path (configurable via env)
    let webui_dir = std::env::var("WEBUI_DIR").unwrap_or_else(|_| "webui".to_string());

    let cors = cors_layer(&state.config().cors.allowed_origin);

    // API routes
    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health))
        // Tickets
        .route("/tickets", get(tickets::list_tickets))
        .route("/tickets", post(tickets::create_ticket))
        .route("/tickets/{id}", get(tickets::get_ticket))
        .route("/tickets/{id}", put(tickets::update_ticket))
        .route("/tickets/{id}", delete(tickets::delete_ticket))
        .with_state(state);

    // Serve the web UI with SPA fallback
    let index_path = format!("{}/index.html", webui_dir);
    let serve_dir = ServeDir::new(&webui_dir).fallback(ServeFile::new(&index_path));

    Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(handlers::metrics))
        .fallback_service(serve_dir)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origin: &str) -> CorsLayer {
    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            warn!(
                "Invalid cors.allowed_origin {:?}, cross-origin requests disabled",
                allowed_origin
            );
            CorsLayer::new()
        }
    }
}
