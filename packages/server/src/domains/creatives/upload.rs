//! Validation and on-disk storage for uploaded creative files.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Upper bound on an upload request body.
pub const MAX_UPLOAD_BYTES: usize = 10 << 20;

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("scheduled_at is required")]
    MissingScheduledAt,

    #[error("invalid date format for scheduled_at")]
    InvalidDate,

    #[error("cannot set scheduled_at before today")]
    DateInPast,

    #[error("file is required")]
    MissingFile,

    #[error("invalid file type: only images are allowed")]
    InvalidFileType,

    #[error("file too large: uploads are limited to 10 MiB")]
    TooLarge,

    #[error("invalid multipart form")]
    Malformed,

    #[error("failed to save file: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse `YYYY-MM-DD` and reject dates before `today`.
pub fn validate_scheduled_at(raw: &str, today: NaiveDate) -> Result<NaiveDate, UploadError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UploadError::MissingScheduledAt);
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| UploadError::InvalidDate)?;
    if date < today {
        return Err(UploadError::DateInPast);
    }
    Ok(date)
}

/// Lower-cased extension of `filename` if it is an allowed image type.
pub fn image_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Write `bytes` under a fresh UUID name inside `upload_dir`, keeping the
/// original extension. Returns the stored path.
pub async fn save_upload(
    upload_dir: &Path,
    original_filename: &str,
    bytes: &[u8],
) -> Result<PathBuf, UploadError> {
    let ext = image_extension(original_filename).ok_or(UploadError::InvalidFileType)?;
    let destination = upload_dir.join(format!("{}.{}", Uuid::new_v4(), ext));

    tokio::fs::write(&destination, bytes).await?;
    Ok(destination)
}
