use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use mural_db::config::{DatabaseConfig, Engine, SslMode};
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 8000;

/// Secrets that ship in sample `.env` files and must never sign real tokens.
const PLACEHOLDER_SECRETS: &[&str] = &["changeme", "change-me", "secret", "dev-secret-change-me"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub secret_key: String,
    pub token_ttl: chrono::Duration,
    pub request_timeout: Duration,
    pub database: DatabaseConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("SERVER_PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
                warn!("Invalid SERVER_PORT '{raw}' ({e}), using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
        };

        let secret_key = match var("SECRET_KEY") {
            Some(key) => key,
            None => bail!("SECRET_KEY must be set"),
        };
        if PLACEHOLDER_SECRETS.contains(&secret_key.trim()) {
            bail!("SECRET_KEY is a placeholder value, set a real secret");
        }

        let token_ttl_hours: i64 = parse_or("TOKEN_TTL_HOURS", var("TOKEN_TTL_HOURS"), 6)?;
        let Some(token_ttl) = chrono::TimeDelta::try_hours(token_ttl_hours) else {
            bail!("TOKEN_TTL_HOURS value {token_ttl_hours} is out of range");
        };
        let timeout_secs: u64 = parse_or("REQUEST_TIMEOUT_SECS", var("REQUEST_TIMEOUT_SECS"), 30)?;

        let engine: Engine = match var("DATABASE_SCHEMA") {
            Some(raw) => raw.parse()?,
            None => Engine::Postgres,
        };
        let ssl_mode: SslMode = match var("DATABASE_SSL_MODE") {
            Some(raw) => raw.parse()?,
            None => SslMode::Disable,
        };

        let database = DatabaseConfig {
            engine,
            host: var("DATABASE_HOST").unwrap_or_else(|| "localhost".into()),
            port: parse_or("DATABASE_PORT", var("DATABASE_PORT"), 5432)?,
            user: var("POSTGRES_USER").unwrap_or_else(|| "postgres".into()),
            password: lookup("POSTGRES_PASSWORD").unwrap_or_default(),
            name: var("POSTGRES_NAME").unwrap_or_else(|| "mural".into()),
            ssl_mode,
            pool_size: parse_or("DATABASE_POOL_SIZE", var("DATABASE_POOL_SIZE"), 16)?,
        };

        Ok(Self {
            host: var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            secret_key,
            token_ttl,
            request_timeout: Duration::from_secs(timeout_secs),
            database,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {key} value '{raw}'")),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("SECRET_KEY", "s3cr3t-value")]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.token_ttl, chrono::Duration::hours(6));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.database.engine, Engine::Postgres);
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.ssl_mode, SslMode::Disable);
        assert_eq!(config.database.pool_size, 16);
    }

    #[test]
    fn bad_port_falls_back_to_default() {
        let config = load(&[("SECRET_KEY", "s3cr3t-value"), ("SERVER_PORT", "eighty")]).unwrap();
        assert_eq!(config.port, 8000);

        let config = load(&[("SECRET_KEY", "s3cr3t-value"), ("SERVER_PORT", "9001")]).unwrap();
        assert_eq!(config.port, 9001);
    }

    #[test]
    fn secret_is_required_and_not_a_placeholder() {
        assert!(load(&[]).is_err());
        assert!(load(&[("SECRET_KEY", "  ")]).is_err());
        assert!(load(&[("SECRET_KEY", "changeme")]).is_err());
    }

    #[test]
    fn database_settings_are_read() {
        let config = load(&[
            ("SECRET_KEY", "s3cr3t-value"),
            ("DATABASE_SCHEMA", "sqlite"),
            ("POSTGRES_NAME", ":memory:"),
            ("DATABASE_SSL_MODE", "require"),
            ("DATABASE_POOL_SIZE", "4"),
            ("POSTGRES_PASSWORD", "pw"),
        ])
        .unwrap();
        assert_eq!(config.database.engine, Engine::Sqlite);
        assert_eq!(config.database.name, ":memory:");
        assert_eq!(config.database.ssl_mode, SslMode::Require);
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.database.password, "pw");
    }

    #[test]
    fn malformed_numbers_are_errors() {
        assert!(load(&[("SECRET_KEY", "s3cr3t-value"), ("DATABASE_PORT", "x")]).is_err());
        assert!(load(&[("SECRET_KEY", "s3cr3t-value"), ("DATABASE_SCHEMA", "mysql")]).is_err());
    }

    #[test]
    fn oversized_token_ttl_is_an_error() {
        let err = load(&[("SECRET_KEY", "s3cr3t-value"), ("TOKEN_TTL_HOURS", "9999999999999999")])
            .err()
            .unwrap();
        assert!(err.to_string().contains("TOKEN_TTL_HOURS"));

        let config = load(&[("SECRET_KEY", "s3cr3t-value"), ("TOKEN_TTL_HOURS", "48")]).unwrap();
        assert_eq!(config.token_ttl, chrono::Duration::hours(48));
    }
}
