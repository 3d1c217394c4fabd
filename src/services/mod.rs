pub mod metric_series;
pub mod metrics_feed_service;
pub mod metrics_window;
pub mod virtual_table;
