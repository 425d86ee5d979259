use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Longest lifetime a bearer token may be configured with (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    pub env: String,
    pub db_max_connections: u32,
    pub db_max_idle_time: Duration,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_phone_number: String,
    /// Prefix applied to the locally-formatted phone numbers users sign up with.
    pub sms_country_code: String,
    pub upload_dir: PathBuf,
    pub token_ttl: chrono::Duration,
    pub shutdown_grace: Duration,
    /// Upper bound on handling a single request, body read included.
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            port: parse_or("PORT", 4000)?,
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 25)?,
            db_max_idle_time: Duration::from_secs(parse_or("DB_MAX_IDLE_SECS", 60)?),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID")
                .context("TWILIO_ACCOUNT_SID must be set")?,
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN")
                .context("TWILIO_AUTH_TOKEN must be set")?,
            twilio_phone_number: env::var("TWILIO_PHONE_NUMBER")
                .context("TWILIO_PHONE_NUMBER must be set")?,
            sms_country_code: env::var("SMS_COUNTRY_CODE").unwrap_or_else(|_| "+91".to_string()),
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "./uploads".to_string())
                .into(),
            token_ttl: token_ttl_from_hours(parse_or("TOKEN_TTL_HOURS", 48)?)?,
            shutdown_grace: Duration::from_secs(parse_or("SHUTDOWN_GRACE_SECS", 5)?),
            request_timeout: request_timeout_from_secs(parse_or("REQUEST_TIMEOUT_SECS", 30)?)?,
        })
    }
}

/// Tokens must outlive the request that issues them and stay within a year.
fn token_ttl_from_hours(hours: i64) -> Result<chrono::Duration> {
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        bail!("TOKEN_TTL_HOURS must be between 1 and {MAX_TOKEN_TTL_HOURS}, got {hours}");
    }
    Ok(chrono::Duration::hours(hours))
}

fn request_timeout_from_secs(secs: u64) -> Result<Duration> {
    if secs == 0 {
        bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number")),
        Err(_) => Ok(default),
    }
}
