// src/config.rs
use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::errors::{ResqError, ResqResult};

#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Memory,
    Redis(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub webhook_url: Option<String>,
    pub seed_demo: bool,
    pub feed_capacity: usize,
    pub cors_origin: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            store: StoreBackend::Memory,
            webhook_url: None,
            seed_demo: false,
            feed_capacity: 200,
            cors_origin: None,
        }
    }
}

impl AppConfig {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> ResqResult<Self> {
        if dotenvy::dotenv().is_ok() {
            info!("Loaded .env file");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ResqResult<Self> {
        let store = match try_load::<String>(&lookup, "RESQNET_STORE", "memory")?
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => StoreBackend::Memory,
            "redis" => {
                let url = optional(&lookup, "REDIS_URL")
                    .ok_or_else(|| ResqError::InvalidConfiguration("REDIS_URL is required for the redis store".into()))?;
                StoreBackend::Redis(url)
            }
            other => {
                return Err(ResqError::InvalidConfiguration(format!(
                    "RESQNET_STORE must be memory or redis, got {other}"
                )));
            }
        };

        let config = Self {
            host: try_load(&lookup, "RESQNET_HOST", "0.0.0.0")?,
            port: try_load(&lookup, "RESQNET_PORT", "5000")?,
            store,
            webhook_url: optional(&lookup, "RESQNET_WEBHOOK_URL"),
            seed_demo: try_load(&lookup, "RESQNET_SEED_DEMO", "false")?,
            feed_capacity: try_load(&lookup, "RESQNET_FEED_CAPACITY", "200")?,
            cors_origin: optional(&lookup, "RESQNET_CORS_ORIGIN"),
        };

        if config.feed_capacity == 0 {
            return Err(ResqError::InvalidConfiguration("RESQNET_FEED_CAPACITY must be positive".into()));
        }
        Ok(config)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn try_load<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> ResqResult<T>
where
    T::Err: Display,
{
    optional(lookup, key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            ResqError::InvalidConfiguration(format!("{key}: {e}"))
        })
}
