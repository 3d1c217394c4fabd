use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::external::metrics_source::{FetchError, MetricsSource};
use crate::models::{MetricSnapshot, MetricsIdentity};

/// Client for the gestion-bc REST API.
pub struct GestionBcApi {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl GestionBcApi {
    pub fn new(base_url: Url, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    fn metrics_url(&self) -> String {
        format!(
            "{}/dashboard/metrics",
            self.base_url.as_str().trim_end_matches('/')
        )
    }

    fn authorization(&self) -> String {
        match &self.token {
            Some(token) => format!("Bearer {}", token),
            None => String::new(),
        }
    }
}

#[async_trait]
impl MetricsSource for GestionBcApi {
    async fn fetch_metrics(
        &self,
        identity: &MetricsIdentity,
    ) -> Result<Vec<MetricSnapshot>, FetchError> {
        let start_date = identity.start_date.format("%Y-%m-%d").to_string();
        let end_date = identity.end_date.format("%Y-%m-%d").to_string();

        debug!(
            "GET dashboard metrics for {} / {} ({} → {})",
            identity.email, identity.famille, start_date, end_date
        );

        let resp = self
            .client
            .get(self.metrics_url())
            .query(&[
                ("email", identity.email.as_str()),
                ("famille", identity.famille.as_str()),
                ("startDate", start_date.as_str()),
                ("endDate", end_date.as_str()),
            ])
            .header(AUTHORIZATION, self.authorization())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Unauthorized,
                StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited,
                _ => FetchError::BadResponse(format!("API returned status: {}", status)),
            });
        }

        resp.json::<Vec<MetricSnapshot>>()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}
