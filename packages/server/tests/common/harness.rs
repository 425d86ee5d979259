//! Postgres and Redis for the store tests, started in Docker.
//!
//! One Postgres 16 and one Redis container serve the whole test binary. The
//! schema is migrated when the first test asks for it.

use anyhow::{Context, Result};
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::redis::Redis;
use tokio::sync::OnceCell;

/// Connection URLs plus the container handles behind them.
struct SharedTestInfra {
    db_url: String,
    redis_url: String,
    // Dropping a handle stops its container
    _postgres: ContainerAsync<Postgres>,
    _redis: ContainerAsync<Redis>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // RUST_LOG=cheershare_core=debug shows store logs for --ignored runs
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let (postgres, db_url) = start_postgres().await?;
        let (redis, redis_url) = start_redis().await?;

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        pool.close().await;

        Ok(Self {
            db_url,
            redis_url,
            _postgres: postgres,
            _redis: redis,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to start Postgres/Redis containers")
            })
            .await
    }
}

async fn start_postgres() -> Result<(ContainerAsync<Postgres>, String)> {
    let container = Postgres::default()
        .with_tag("16")
        .start()
        .await
        .context("Failed to start Postgres container")?;
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let url = format!("postgresql://postgres:postgres@{host}:{port}/postgres");
    Ok((container, url))
}

async fn start_redis() -> Result<(ContainerAsync<Redis>, String)> {
    let container = Redis::default()
        .start()
        .await
        .context("Failed to start Redis container")?;
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(6379).await?;
    Ok((container, format!("redis://{host}:{port}")))
}

/// Per-test handles on the shared containers.
///
/// Tests take it through `#[test_context(TestHarness)]` and build the
/// `Postgres*` stores or a `RedisOtpCache` over it. Rows are never cleaned up,
/// so tests key their data with [`unique_phone`].
pub struct TestHarness {
    pub db_pool: PgPool,
    pub redis_url: String,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl TestHarness {
    /// Open a pool of its own on the migrated database.
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .context("Failed to connect to test database")?;

        Ok(Self {
            db_pool,
            redis_url: infra.redis_url.clone(),
        })
    }
}

/// Phone number no other test uses, so shared containers need no cleanup.
pub fn unique_phone() -> String {
    let n = uuid::Uuid::new_v4().as_u128() % 10_000_000_000;
    format!("{n:010}")
}
