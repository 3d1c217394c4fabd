use crate::services::metrics_feed_service::FeedRegistry;

#[derive(Clone)]
pub struct AppState {
    pub feeds: FeedRegistry,
}
