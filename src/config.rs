use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;
use url::Url;

use crate::services::metrics_feed_service::{DEFAULT_IDLE_TTL, DEFAULT_REFRESH_INTERVAL};

const MIN_REFRESH_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the gestion-bc REST API, e.g. `https://host/api`.
    pub api_url: Url,
    pub api_token: Option<String>,
    pub bind_addr: SocketAddr,
    pub refresh_interval: Duration,
    /// Unread feeds are dropped after this long.
    pub feed_idle_ttl: Duration,
    /// `None` allows any origin.
    pub cors_allowed_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_url = var("GESTION_BC_API_URL").context("GESTION_BC_API_URL must be set")?;
        let api_url = Url::parse(raw_url.trim())
            .with_context(|| format!("GESTION_BC_API_URL is not a valid URL: {}", raw_url))?;

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be host:port")?;

        let refresh_interval = match var("METRICS_REFRESH_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("METRICS_REFRESH_SECS is not a number: {}", raw))?;
                if secs < MIN_REFRESH_SECS {
                    warn!(
                        "Metrics refresh interval too short ({}s), using minimum {}s",
                        secs, MIN_REFRESH_SECS
                    );
                    Duration::from_secs(MIN_REFRESH_SECS)
                } else {
                    Duration::from_secs(secs)
                }
            }
            None => DEFAULT_REFRESH_INTERVAL,
        };

        let feed_idle_ttl = match var("FEED_IDLE_TTL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .with_context(|| format!("FEED_IDLE_TTL_SECS is not a number: {}", raw))?,
            None => DEFAULT_IDLE_TTL,
        };
        if feed_idle_ttl < refresh_interval {
            warn!(
                "Feed idle TTL {:?} is shorter than the refresh interval {:?}",
                feed_idle_ttl, refresh_interval
            );
        }

        Ok(Self {
            api_url,
            api_token: var("GESTION_BC_API_TOKEN"),
            bind_addr,
            refresh_interval,
            feed_idle_ttl,
            cors_allowed_origin: var("CORS_ALLOWED_ORIGIN"),
        })
    }
}
