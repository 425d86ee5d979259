//! Creatives domain - scheduled image assets uploaded by users

pub mod models;
pub mod upload;

pub use models::{Creative, ScheduledCreatives};
pub use upload::{validate_scheduled_at, UploadError};
