// HTTP routes
pub mod creatives;
pub mod health;
pub mod signup;

pub use creatives::*;
pub use health::*;
pub use signup::*;
