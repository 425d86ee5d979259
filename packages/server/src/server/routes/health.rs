use std::future::Future;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::common::StoreError;
use crate::server::app::AppState;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    database: ComponentHealth,
    cache: ComponentHealth,
    background_tasks: usize,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentHealth {
    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

async fn probe<F>(check: F) -> ComponentHealth
where
    F: Future<Output = Result<(), StoreError>>,
{
    match tokio::time::timeout(PROBE_TIMEOUT, check).await {
        Ok(Ok(())) => ComponentHealth {
            status: "ok".to_string(),
            error: None,
        },
        Ok(Err(e)) => ComponentHealth {
            status: "error".to_string(),
            error: Some(format!("Probe failed: {}", e)),
        },
        Err(_) => ComponentHealth {
            status: "error".to_string(),
            error: Some("Probe timeout (>5s)".to_string()),
        },
    }
}

/// Health check endpoint
///
/// Checks:
/// - Database connectivity
/// - OTP cache connectivity
///
/// Returns 200 OK if both respond, 503 Service Unavailable otherwise.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (database, cache) = tokio::join!(
        probe(state.deps.users.ping()),
        probe(state.deps.otp_store.ping())
    );

    let is_healthy = database.is_ok() && cache.is_ok();
    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
        database,
        cache,
        background_tasks: state.deps.background.len(),
    };

    (status_code, Json(response))
}
