use anyhow::Context;
use rust_decimal::Decimal;
use std::env;

const DEV_SESSION_SECRET: &str = "ghsabet-dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Unset means the in-memory store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,

    // Sessions
    pub session_secret: String,
    pub session_ttl_secs: i64,

    // Accounts
    pub default_balance: Decimal,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,

    // Settlement
    pub settlement_sweep_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from any variable source. Without `DATABASE_URL` the service runs
    /// as a dev instance on the in-memory store and may use the built-in
    /// session secret; with a database, `SESSION_SECRET` must be set.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = var("DATABASE_URL").filter(|s| !s.is_empty());

        let session_secret = match var("SESSION_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None if database_url.is_none() => {
                tracing::warn!("SESSION_SECRET not set, using the development secret");
                DEV_SESSION_SECRET.to_string()
            }
            None => anyhow::bail!("SESSION_SECRET must be set when DATABASE_URL is configured"),
        };

        let default_balance: Decimal = var("DEFAULT_BALANCE")
            .unwrap_or_else(|| "500.00".into())
            .trim()
            .parse()
            .context("DEFAULT_BALANCE must be a decimal amount")?;
        if default_balance < Decimal::ZERO {
            anyhow::bail!("DEFAULT_BALANCE cannot be negative");
        }

        Ok(Self {
            database_url,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: var("PORT")
                .unwrap_or_else(|| "8080".into())
                .parse()
                .context("PORT must be a port number")?,

            session_secret,
            session_ttl_secs: var("SESSION_TTL_SECS")
                .unwrap_or_else(|| "86400".into())
                .parse()
                .context("SESSION_TTL_SECS must be a whole number of seconds")?,

            default_balance,
            admin_username: var("ADMIN_USERNAME").filter(|s| !s.is_empty()),
            admin_password: var("ADMIN_PASSWORD").filter(|s| !s.is_empty()),

            settlement_sweep_interval_secs: var("SETTLEMENT_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|| "60".into())
                .parse()
                .context("SETTLEMENT_SWEEP_INTERVAL_SECS must be a whole number of seconds")?,
        })
    }

    /// Defaults with the in-memory store; used by tests and local runs.
    pub fn for_memory() -> Self {
        Self {
            database_url: None,
            host: "127.0.0.1".into(),
            port: 8080,
            session_secret: DEV_SESSION_SECRET.into(),
            session_ttl_secs: 86_400,
            default_balance: Decimal::new(50000, 2),
            admin_username: None,
            admin_password: None,
            settlement_sweep_interval_secs: 0,
        }
    }

    pub fn sweeper_enabled(&self) -> bool {
        self.settlement_sweep_interval_secs > 0
    }
}
