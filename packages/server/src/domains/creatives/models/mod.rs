pub mod creative;

pub use creative::{Creative, ScheduledCreatives};
