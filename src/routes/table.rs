use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{TableView, TableViewRequest};
use crate::services::virtual_table::VirtualTable;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/view", post(view_table))
}

pub async fn view_table(Json(request): Json<TableViewRequest>) -> Result<Json<TableView>, AppError> {
    info!(
        "POST /api/table/view - {} records, scrollTop {}",
        request.records.len(),
        request.scroll_top
    );

    if request.columns.is_empty() {
        return Err(AppError::Validation("at least one column is required".to_string()));
    }

    let mut table = VirtualTable::new(&request.records, &request.columns);
    if let Some(row_height) = request.row_height {
        table = table.with_row_height(row_height);
    }
    if let Some(container_height) = request.container_height {
        table = table.with_container_height(container_height);
    }
    if let Some(overscan) = request.overscan {
        table = table.with_overscan(overscan);
    }

    Ok(Json(TableView {
        headers: table.headers().to_vec(),
        total_height: table.total_height(),
        rows: table.render(request.scroll_top),
    }))
}
