// Request identity and authentication errors

pub mod errors;
pub mod identity;

pub use errors::AuthError;
pub use identity::Identity;
