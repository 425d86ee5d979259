// Business domains
pub mod auth;
pub mod creatives;
pub mod users;
