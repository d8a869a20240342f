//! Monitor configuration
//!
//! Everything comes from the environment (optionally seeded from a `.env`
//! file). Missing required variables are reported together so a broken
//! deployment is fixed in one pass.

use sdl_common::env;
use sdl_common::storage::StorageConfig;
use std::time::Duration;

/// Default per-request timeout for the chat webhook.
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;

pub const WEBHOOK_URL_VAR: &str = "TEAMS_WEBHOOK_URL";
pub const AUDIT_BUCKET_VAR: &str = "MONITOR_S3";
pub const AUDIT_DATABASE_VAR: &str = "MONITOR_DATABASE";
pub const AUDIT_TABLE_VAR: &str = "MONITOR_TABLE";

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub webhook_url: String,
    /// Bucket (and optional custom endpoint) for audit records
    pub audit: StorageConfig,
    pub audit_database: String,
    pub audit_table: String,
    pub webhook_timeout_secs: u64,
    pub region: Option<String>,
}

impl MonitorConfig {
    /// Load `.env` (if any), read the environment, and validate.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Read the environment without touching `.env` files.
    pub fn from_env() -> anyhow::Result<Self> {
        let required = env::require_all(&[
            WEBHOOK_URL_VAR,
            AUDIT_BUCKET_VAR,
            AUDIT_DATABASE_VAR,
            AUDIT_TABLE_VAR,
        ])?;

        let [webhook_url, bucket, audit_database, audit_table]: [String; 4] = required
            .try_into()
            .map_err(|_| anyhow::anyhow!("required variable lookup returned the wrong count"))?;

        let mut audit = StorageConfig::from_env(AUDIT_BUCKET_VAR)?;
        audit.bucket = bucket;

        Ok(Self {
            webhook_url,
            audit,
            audit_database,
            audit_table,
            webhook_timeout_secs: env::parse_var(
                "MONITOR_WEBHOOK_TIMEOUT_SECS",
                DEFAULT_WEBHOOK_TIMEOUT_SECS,
            )?,
            region: env::optional_var("AWS_REGION"),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.webhook_url.starts_with("https://") || self.webhook_url.starts_with("http://")) {
            anyhow::bail!("{} must be an http(s) URL", WEBHOOK_URL_VAR);
        }

        if self.webhook_timeout_secs == 0 {
            anyhow::bail!("MONITOR_WEBHOOK_TIMEOUT_SECS must be greater than 0");
        }

        // Both become path segments of the audit key.
        for (name, value) in [
            (AUDIT_DATABASE_VAR, &self.audit_database),
            (AUDIT_TABLE_VAR, &self.audit_table),
        ] {
            if value.contains('/') {
                anyhow::bail!("{} must not contain '/': {}", name, value);
            }
        }

        Ok(())
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }
}
