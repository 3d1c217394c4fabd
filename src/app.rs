use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{dashboard, health, table};
use crate::state::AppState;

pub fn create_app(state: AppState, cors: CorsLayer) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/dashboard", dashboard::router())
        .nest("/api/table", table::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the dashboard front end; `None` allows any origin.
pub fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer, InvalidHeaderValue> {
    let origin = match allowed_origin {
        Some(origin) => AllowOrigin::exact(HeaderValue::from_str(origin)?),
        None => AllowOrigin::any(),
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any))
}
