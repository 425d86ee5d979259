// HTTP middleware
pub mod auth;
pub mod panic;

pub use auth::*;
pub use panic::*;
