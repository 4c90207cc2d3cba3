//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use axum::http::HeaderName;
use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::store::Store;

pub use routes::create_router;

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the full application: routes, request ids, logging and tracing
pub fn build_app(store: Store) -> Router {
    let request_id = HeaderName::from_static(middleware::REQUEST_ID_HEADER);

    // Layers run outermost-last: the id is set before logging sees the request
    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(create_router())
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(store)
}
