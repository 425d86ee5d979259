//! Kernel module - server infrastructure and dependencies.

pub mod background;
pub mod deps;
pub mod postgres_stores;
pub mod redis_otp_cache;
pub mod test_dependencies;
pub mod traits;

pub use background::BackgroundTasks;
pub use deps::{ServerDeps, ServerSettings, TwilioAdapter};
pub use postgres_stores::{
    bounded, PostgresCreativeStore, PostgresTokenStore, PostgresUserStore, STORE_TIMEOUT,
};
pub use redis_otp_cache::RedisOtpCache;
pub use test_dependencies::TestDependencies;
pub use traits::*;
