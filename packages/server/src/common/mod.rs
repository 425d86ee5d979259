// Common types and utilities shared across the application

pub mod auth;
pub mod errors;

pub use auth::{AuthError, Identity};
pub use errors::StoreError;
