// Cheershare - API Core
//
// Backend for a creative-sharing app: phone-number OTP signup, opaque bearer
// tokens, and scheduled creative uploads.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
