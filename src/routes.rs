use axum::{extract::DefaultBodyLimit, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::routes as content_routes;
use crate::network;
use crate::state::AppState;
use crate::uploads::routes as upload_routes;
use crate::uploads::store::uploads_dir;
use crate::ws::handler as ws_handler;

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // /api/content/text, /image and /clear are static segments and take
    // precedence over the /api/content/{id} capture.
    let content = Router::new()
        .route(
            "/api/content",
            axum::routing::get(content_routes::list_content),
        )
        .route(
            "/api/content/text",
            axum::routing::post(content_routes::add_text_content),
        )
        .route(
            "/api/content/image",
            axum::routing::post(content_routes::add_image_content),
        )
        .route(
            "/api/content/clear",
            axum::routing::post(content_routes::clear_content),
        )
        .route(
            "/api/content/{id}",
            axum::routing::delete(content_routes::delete_content),
        );

    let uploads = Router::new()
        .route(
            "/api/upload/file",
            axum::routing::post(upload_routes::upload_file),
        )
        .route(
            "/api/upload/files",
            axum::routing::get(upload_routes::list_uploads),
        )
        .route(
            "/api/upload/file/{url}",
            axum::routing::delete(upload_routes::delete_upload),
        );

    let network_routes = Router::new().route("/api/network/ip", axum::routing::get(network::get_ip));

    // WebSocket sync endpoint
    let ws_routes = Router::new().route("/ws", axum::routing::get(ws_handler::ws_upgrade));

    // Health check
    let health = Router::new().route("/health", axum::routing::get(health_check));

    let max_body_bytes = state.max_upload_size_mb as usize * 1024 * 1024;

    Router::new()
        .merge(content)
        .merge(uploads)
        .merge(network_routes)
        .merge(ws_routes)
        .merge(health)
        // Uploaded files are served straight from the uploads directory,
        // at the same /uploads/... paths the records point at.
        .nest_service("/uploads", ServeDir::new(uploads_dir(&state.data_dir)))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        // The board UI is served from another port on the LAN; keep CORS open.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
