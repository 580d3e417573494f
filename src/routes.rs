use axum::{Router, http::StatusCode, middleware, routing::get};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::auth::auth_middleware;
use crate::handlers;

/// Create file server routes
pub fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::dispatch))
        .route("/{*path}", get(handlers::dispatch))
}

/// Full application: routes behind the auth gate, with tracing and a per-request timeout.
pub fn build_router(state: AppState) -> Router {
    let timeout = state.config.request_timeout();

    file_routes()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
