use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "changeme",
    "secret",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub token_ttl_secs: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = lookup("HUDDLE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.trim().is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("HUDDLE_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let db_path = lookup("HUDDLE_DB_PATH")
            .unwrap_or_else(|| "huddle.db".into())
            .into();
        let host = lookup("HUDDLE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = lookup("HUDDLE_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("HUDDLE_PORT must be a port number")?;
        let token_ttl_secs: i64 = lookup("HUDDLE_TOKEN_TTL_SECS")
            .unwrap_or_else(|| "86400".into()) // 24h
            .parse()
            .context("HUDDLE_TOKEN_TTL_SECS must be a number of seconds")?;
        if token_ttl_secs <= 0 {
            bail!("HUDDLE_TOKEN_TTL_SECS must be positive");
        }

        Ok(Self {
            jwt_secret,
            db_path,
            host,
            port,
            token_ttl_secs,
        })
    }
}
