// Main entry point for API server

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cheershare_core::domains::auth::OtpStore;
use cheershare_core::kernel::{
    PostgresCreativeStore, PostgresTokenStore, PostgresUserStore, RedisOtpCache, ServerDeps,
    ServerSettings, TwilioAdapter,
};
use cheershare_core::{server::build_app, Config};
use sqlx::postgres::PgPoolOptions;
use tokio::signal::ctrl_c;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twilio::{TwilioOptions, TwilioService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cheershare_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    info!("Starting Cheershare API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(env = %config.env, "Configuration loaded");

    // Connect to database
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .idle_timeout(config.db_max_idle_time)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected");

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations complete");

    // Connect to Redis
    let otp_cache = RedisOtpCache::connect(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;
    info!("Redis connected");

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload dir {}", config.upload_dir.display()))?;

    let twilio = Arc::new(TwilioService::new(TwilioOptions {
        account_sid: config.twilio_account_sid.clone(),
        auth_token: config.twilio_auth_token.clone(),
        from_number: config.twilio_phone_number.clone(),
    }));

    let deps = ServerDeps::new(
        Arc::new(PostgresUserStore::new(pool.clone())),
        Arc::new(PostgresTokenStore::new(pool.clone())),
        OtpStore::new(Arc::new(otp_cache)),
        Arc::new(TwilioAdapter::new(twilio)),
        Arc::new(PostgresCreativeStore::new(pool.clone())),
        ServerSettings::from(&config),
    );
    let background = deps.background.clone();

    // Build application
    let app = build_app(deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    info!("Server running on {}", addr);
    info!("Health check: http://localhost:{}/health", config.port);

    let shutdown = CancellationToken::new();
    let mut server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
        }
    });

    tokio::select! {
        result = &mut server => {
            result.context("Server task failed")?.context("Server error")?;
            warn!("Server stopped without a shutdown signal");
        }
        _ = shutdown_signal() => {
            shutdown.cancel();
            match tokio::time::timeout(config.shutdown_grace, &mut server).await {
                Ok(Ok(Ok(()))) => info!("All connections drained"),
                Ok(Ok(Err(e))) => error!(error = %e, "Server error during shutdown"),
                Ok(Err(e)) => error!(error = %e, "Server task failed during shutdown"),
                Err(_) => {
                    warn!(grace = ?config.shutdown_grace, "Grace period elapsed, dropping open connections");
                    server.abort();
                }
            }
        }
    }

    info!(pending = background.len(), "Waiting for background tasks");
    background.shutdown().await;
    pool.close().await;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
