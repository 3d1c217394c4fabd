use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use thiserror::Error;

use crate::external::metrics_source::FetchError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found")]
    NotFound,
    #[error("Rate limited by upstream API")]
    RateLimited,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Metrics fetch failed: {0}")]
    Fetch(FetchError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
            AppError::RateLimited => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("60"));
                (StatusCode::TOO_MANY_REQUESTS, headers, "Rate limited").into_response()
            }
            AppError::Fetch(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(value: FetchError) -> Self {
        match value {
            FetchError::RateLimited => AppError::RateLimited,
            FetchError::Unauthorized => AppError::Unauthorized,
            other => AppError::Fetch(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (AppError::Fetch(FetchError::Network("reset".into())), StatusCode::BAD_GATEWAY),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_upstream_auth_failure_maps_to_unauthorized() {
        assert!(matches!(AppError::from(FetchError::Unauthorized), AppError::Unauthorized));
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::from(FetchError::RateLimited).into_response();
        assert_eq!(response.headers().get("Retry-After").unwrap(), "60");
    }
}
