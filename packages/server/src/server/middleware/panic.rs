use std::any::Any;

use axum::{
    http::{header::CONNECTION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Turn a handler panic into a generic 500 and close the connection.
///
/// Used with `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    error!(panic = detail, "Handler panicked");

    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": "The server encountered a problem and could not process your request",
        })),
    )
        .into_response();
    response
        .headers_mut()
        .insert(CONNECTION, HeaderValue::from_static("close"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_response_closes_connection() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONNECTION], "close");
    }
}
