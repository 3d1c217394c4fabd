pub mod gestion_bc_api;
pub mod metrics_source;
