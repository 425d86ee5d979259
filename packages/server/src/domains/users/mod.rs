//! Users domain - identity records keyed by phone number
//!
//! Users are created on the first successful OTP verification for a phone
//! number and are not mutated afterwards.

pub mod directory;
pub mod models;

pub use directory::get_or_create;
pub use models::User;
