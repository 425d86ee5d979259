use serde::Deserialize;

/// Subset of the Message resource returned by `POST /Messages.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub sid: String,
    pub status: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

/// Error document Twilio returns alongside non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: Option<i64>,
    pub message: String,
}
