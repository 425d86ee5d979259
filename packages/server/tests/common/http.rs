//! In-process HTTP client over the axum router, backed by in-memory
//! dependencies.

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use cheershare_core::domains::auth::{issue_token, SCOPE_AUTHENTICATION};
use cheershare_core::domains::users::User;
use cheershare_core::kernel::{BaseUserStore, ServerDeps, TestDependencies};
use cheershare_core::server::build_app;
use serde_json::Value;
use tower::ServiceExt;

pub const BOUNDARY: &str = "cheershare-test-boundary";

/// Response captured for assertions.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Router plus handles on the mocks behind it.
pub struct TestApp {
    pub mocks: TestDependencies,
    pub deps: ServerDeps,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let mocks = TestDependencies::new();
        let deps = mocks.server_deps();
        let router = build_app(deps.clone());
        Self {
            mocks,
            deps,
            router,
        }
    }

    /// Wait for background SMS sends to finish.
    pub async fn settle(&self) {
        self.deps.background.shutdown().await;
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn post_json(&self, path: &str, body: Value) -> TestResponse {
        self.post_raw(path, body.to_string()).await
    }

    pub async fn post_raw(&self, path: &str, body: impl Into<String>) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.into()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, path: &str, authorization: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn upload(
        &self,
        authorization: Option<&str>,
        scheduled_at: Option<&str>,
        file: Option<(&str, &[u8])>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/upload-creative")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let body = multipart_body(scheduled_at, file);
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Insert a user directly and hand back a live bearer header for it.
    pub async fn signed_in_user(&self, name: &str, phone_number: &str) -> (User, String) {
        let user = self
            .mocks
            .users
            .insert(name, phone_number)
            .await
            .expect("Failed to insert user");
        let token = issue_token(
            self.mocks.tokens.as_ref(),
            user.id,
            chrono::Duration::hours(48),
            SCOPE_AUTHENTICATION,
        )
        .await
        .expect("Failed to issue token");
        (user, format!("Bearer {token}"))
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a multipart/form-data body with optional `scheduled_at` and `file`
/// parts.
pub fn multipart_body(scheduled_at: Option<&str>, file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();

    if let Some(date) = scheduled_at {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"scheduled_at\"\r\n\r\n{date}\r\n"
            )
            .as_bytes(),
        );
    }

    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
