use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::MetricsQueryParams;
use crate::services::metric_series::{project_series, ChartSeries, MetricKey};
use crate::services::metrics_feed_service::WindowView;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feeds", post(create_feed))
        .route("/feeds/:feed_id", delete(delete_feed))
        .route("/feeds/:feed_id/metrics", get(get_metrics))
        .route("/feeds/:feed_id/series", get(get_series))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedCreated {
    pub feed_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SeriesParams {
    pub keys: Option<String>,
}

pub async fn create_feed(State(state): State<AppState>) -> (StatusCode, Json<FeedCreated>) {
    let (feed_id, _) = state.feeds.create();
    info!("POST /api/dashboard/feeds - Created metrics feed {}", feed_id);
    (StatusCode::CREATED, Json(FeedCreated { feed_id }))
}

pub async fn delete_feed(
    Path(feed_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /api/dashboard/feeds/{} - Removing metrics feed", feed_id);
    if state.feeds.remove(&feed_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

/// Current window for the requested query. A changed query resets the feed;
/// an uninitialized window is fetched before answering. Fetch failures are
/// reported through `isError` on the view, not as an HTTP error.
pub async fn get_metrics(
    Path(feed_id): Path<Uuid>,
    Query(params): Query<MetricsQueryParams>,
    State(state): State<AppState>,
) -> Result<Json<WindowView>, AppError> {
    info!("GET /api/dashboard/feeds/{}/metrics - Getting metrics window", feed_id);
    let feed = state.feeds.get(&feed_id).ok_or(AppError::NotFound)?;
    let identity = params.resolve(Utc::now().date_naive())?;

    feed.set_identity(identity);
    if !feed.view().initialized {
        if let Err(e) = feed.refresh().await {
            warn!("Cold-start fetch for feed {} failed: {}", feed_id, e);
        }
    }

    Ok(Json(feed.view()))
}

pub async fn get_series(
    Path(feed_id): Path<Uuid>,
    Query(params): Query<SeriesParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ChartSeries>>, AppError> {
    info!("GET /api/dashboard/feeds/{}/series - Projecting chart series", feed_id);
    let feed = state.feeds.get(&feed_id).ok_or(AppError::NotFound)?;
    let keys = MetricKey::parse_list(params.keys.as_deref())?;
    let view = feed.view();
    Ok(Json(project_series(&view.points, &keys)))
}
