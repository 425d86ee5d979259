use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::common::Identity;
use crate::domains::creatives::upload::save_upload;
use crate::domains::creatives::{validate_scheduled_at, Creative, ScheduledCreatives, UploadError};
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthenticatedUser;

#[derive(Serialize)]
pub struct UploadCreativeResponse {
    creative: Creative,
}

#[derive(Serialize)]
pub struct ScheduledCreativesResponse {
    scheduled_creatives: ScheduledCreatives,
}

/// Hitting the body limit surfaces as a stream error; its status tells them apart.
fn multipart_error(err: MultipartError) -> UploadError {
    debug!(error = %err.body_text(), "rejected multipart body");
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge
    } else {
        UploadError::Malformed
    }
}

struct UploadForm {
    scheduled_at: Option<String>,
    file: Option<(String, Vec<u8>)>,
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, UploadError> {
    let mut form = UploadForm {
        scheduled_at: None,
        file: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("scheduled_at") => {
                let text = field
                    .text()
                    .await
                    .map_err(multipart_error)?;
                form.scheduled_at = Some(text);
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(multipart_error)?;
                form.file = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    Ok(form)
}

/// `POST /upload-creative` (authenticated)
pub async fn upload_creative_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Json<UploadCreativeResponse>, ApiError> {
    let form = read_form(&mut multipart).await?;

    let raw_date = form.scheduled_at.ok_or(UploadError::MissingScheduledAt)?;
    let scheduled_at = validate_scheduled_at(&raw_date, Utc::now().date_naive())?;

    let (filename, bytes) = form.file.ok_or(UploadError::MissingFile)?;
    let path = save_upload(&state.deps.settings.upload_dir, &filename, &bytes).await?;
    let creative_url = path.to_string_lossy().into_owned();

    let creative = match state
        .deps
        .creatives
        .insert(user.id, &creative_url, scheduled_at)
        .await
    {
        Ok(creative) => creative,
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                warn!(path = %creative_url, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(ApiError::internal("Failed to save creative", e));
        }
    };

    info!(user_id = user.id, creative_id = creative.id, %scheduled_at, "Creative uploaded");
    Ok(Json(UploadCreativeResponse { creative }))
}

/// `GET /creatives/scheduled`
pub async fn scheduled_creatives_handler(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<ScheduledCreativesResponse>, ApiError> {
    let today = Utc::now().date_naive();
    let tomorrow = today + Duration::days(1);

    let creatives = state
        .deps
        .creatives
        .find_scheduled_on(&[today, tomorrow])
        .await
        .map_err(|e| ApiError::internal("Failed to fetch creatives", e))?;

    debug!(
        anonymous = identity.is_anonymous(),
        count = creatives.len(),
        "Listing scheduled creatives"
    );

    Ok(Json(ScheduledCreativesResponse {
        scheduled_creatives: ScheduledCreatives::group(creatives, today),
    }))
}
