use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: String,
    /// Push endpoint for log shipping; `None` keeps logs on stdout only.
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `LOKI_URL` is only honoured when `LOKI_ENABLED=true`, so a shared
    /// `.env` can carry the URL without every process shipping logs.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let loki_enabled = var("LOKI_ENABLED").is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

        Self {
            filter: var("RUST_LOG").unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            loki_url: if loki_enabled {
                Some(var("LOKI_URL").unwrap_or_default())
            } else {
                None
            },
            service_name: var("SERVICE_NAME").unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string()),
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self.loki_url.as_deref() {
            Some("") => Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string()),
            _ => Ok(()),
        }
    }
}

/// Install the global subscriber: env filter, console output, and the Loki
/// layer when configured. Must run inside the tokio runtime when shipping to
/// Loki, since the push task is spawned here.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.filter)?)
        .with(tracing_subscriber::fmt::layer().with_target(true));

    #[cfg(feature = "loki")]
    let subscriber = subscriber.with(loki_layer(&config)?);

    subscriber.try_init()?;

    match config.loki_url.as_deref() {
        Some(url) if cfg!(feature = "loki") => {
            tracing::info!("📊 {} logging to console and Loki at {}", config.service_name, url)
        }
        Some(_) => tracing::warn!("LOKI_ENABLED is set but built without the `loki` feature"),
        None => tracing::info!("📊 {} logging to console", config.service_name),
    }
    Ok(())
}

#[cfg(feature = "loki")]
fn loki_layer(
    config: &LoggingConfig,
) -> Result<Option<tracing_loki::Layer>, Box<dyn std::error::Error>> {
    let Some(raw) = config.loki_url.as_deref() else {
        return Ok(None);
    };

    let (layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url::Url::parse(raw)?)?;
    tokio::spawn(task);

    Ok(Some(layer))
}
