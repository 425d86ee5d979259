//! Application setup and router configuration.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::domains::creatives::upload::MAX_UPLOAD_BYTES;
use crate::kernel::ServerDeps;
use crate::server::middleware::{authenticate, handle_panic};
use crate::server::routes::{
    health_handler, scheduled_creatives_handler, signup_handler, upload_creative_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
}

/// Build the Axum application router
///
/// Layers, outermost first: CORS, request tracing, panic recovery, request
/// timeout (408), bearer authentication, body limit.
pub fn build_app(deps: ServerDeps) -> Router {
    let request_timeout = deps.settings.request_timeout;
    let state = AppState {
        deps: Arc::new(deps),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .route("/signup", post(signup_handler))
        .route("/upload-creative", post(upload_creative_handler))
        .route("/creatives/scheduled", get(scheduled_creatives_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
