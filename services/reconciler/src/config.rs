// Configuration for the reconciler service

use anyhow::Context;
use chrono::{Duration, NaiveDateTime, Utc};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    /// Telegram Bot API token used for prompts, notifications and delivery.
    pub bot_token: String,
    pub qris_api_url: String,
    pub qris_api_key: String,
    pub qris_merchant_key: String,
    /// Fixed period of the reconciliation timer, in seconds.
    pub poll_interval_secs: u64,
    /// Whole minutes after which a pending record expires.
    pub expiry_minutes: i64,
    /// Whole minutes within which a mutation entry may satisfy a record.
    /// Independent of `expiry_minutes`; the two thresholds are deliberately
    /// separate configuration values.
    pub match_window_minutes: i64,
    /// Offset of the fixed process-wide timezone from UTC, in minutes.
    /// Record and feed timestamps are naive local times in this zone.
    pub tz_offset_minutes: i64,
    /// Directory for one-shot order delivery artifacts.
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let bot_token = env::var("BOT_TOKEN").context("BOT_TOKEN must be set")?;
        let qris_api_url = env::var("QRIS_API_URL").context("QRIS_API_URL must be set")?;
        let qris_api_key = env::var("QRIS_API_KEY").context("QRIS_API_KEY must be set")?;
        let qris_merchant_key =
            env::var("QRIS_MERCHANT_KEY").context("QRIS_MERCHANT_KEY must be set")?;

        let server_port = env_or("RECONCILER_PORT", 8091)?;
        let poll_interval_secs = env_or("POLL_INTERVAL_SECS", 7)?;
        let expiry_minutes = env_or("EXPIRY_MINUTES", 6)?;
        let match_window_minutes = env_or("MATCH_WINDOW_MINUTES", 7)?;
        // Asia/Jakarta (UTC+7) unless configured otherwise
        let tz_offset_minutes = env_or("TZ_OFFSET_MINUTES", 420)?;

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir());

        Ok(Self {
            server_port,
            database_url,
            bot_token,
            qris_api_url,
            qris_api_key,
            qris_merchant_key,
            poll_interval_secs,
            expiry_minutes,
            match_window_minutes,
            tz_offset_minutes,
            data_dir,
        })
    }

    /// Current wall-clock time in the configured fixed timezone, naive.
    pub fn local_now(&self) -> NaiveDateTime {
        (Utc::now() + Duration::minutes(self.tz_offset_minutes)).naive_utc()
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{} must be a valid value, got {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}
