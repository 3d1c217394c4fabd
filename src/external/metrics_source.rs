use async_trait::async_trait;
use thiserror::Error;

use crate::models::{MetricSnapshot, MetricsIdentity};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limited")]
    RateLimited,
}

/// Remote source of daily dashboard metrics.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch_metrics(
        &self,
        identity: &MetricsIdentity,
    ) -> Result<Vec<MetricSnapshot>, FetchError>;
}
