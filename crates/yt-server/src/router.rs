//! Axum router construction.
//!
//! The API is mounted twice: under `/api` and at the root, so both
//! `/api/queue` and `/queue` reach the same handler.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/queue", post(routes::queue::submit))
        .route("/progress/{task_id}", get(routes::progress::get_progress))
        .route(
            "/progress/{task_id}/stream",
            get(routes::stream::progress_stream),
        )
        .route("/download/{task_id}", get(routes::download::download))
        .route("/convert", post(routes::convert::convert))
        .route("/video-info", post(routes::video_info::video_info))
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = api_routes().route("/health", get(routes::health::health));

    Router::new()
        .route("/health", get(routes::health::liveness))
        .nest("/api", api)
        .merge(api_routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
