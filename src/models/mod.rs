pub mod dashboard_metric;
pub mod metrics_query;
pub mod table;

pub use dashboard_metric::MetricSnapshot;
pub use metrics_query::{MetricsIdentity, MetricsQueryParams};
pub use table::{Column, RenderedRow, TableView, TableViewRequest, VisibleRow};
