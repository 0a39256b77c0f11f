//! Router assembly: user and order resources plus operational endpoints.

use crate::handlers::{common, orders, users};
use crate::state::AppState;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Resource routes. Collections answer with and without the trailing slash.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", get(users::list))
        .route("/users/", get(users::list))
        .route(
            "/users/:id",
            get(users::read).put(users::update).delete(users::delete),
        )
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/", get(orders::list).post(orders::create))
        .route(
            "/orders/:id",
            get(orders::read).put(orders::update).delete(orders::delete),
        )
        .with_state(state)
}

/// GET /health, GET /ready, GET /version.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(common::health))
        .route("/ready", get(common::ready))
        .route("/version", get(common::version))
        .with_state(state)
}

/// Full application with tracing and the configured body limit.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.body_limit_bytes;
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(api_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
}
