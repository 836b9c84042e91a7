//! HTTP surface of the shard sizing exporter: environment configuration,
//! the axum router and request logging.

pub mod app;
pub mod config;
pub mod logging;
pub mod state;
