// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers::attempt, state::AppState};

/// Assembles the host-facing router.
///
/// * Nests the attempt routes under `/api/attempts`.
/// * Applies global middleware (Trace, CORS for the configured host origins).
/// * Injects global state (config, backend gateway, mounted attempts).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let attempt_routes = Router::new()
        .route(
            "/{attempt_id}",
            post(attempt::mount_attempt)
                .get(attempt::get_attempt)
                .delete(attempt::unmount_attempt),
        )
        .route("/{attempt_id}/answers", put(attempt::select_answer))
        .route("/{attempt_id}/submit", post(attempt::submit_attempt))
        .route("/{attempt_id}/retry", post(attempt::retry_submission))
        .route("/{attempt_id}/result", get(attempt::get_result));

    Router::new()
        .nest("/api/attempts", attempt_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
