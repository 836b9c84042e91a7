use crate::config::ExporterConfig;
use shardguard_collector::DataStreamCollector;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<DataStreamCollector>,
    pub config: Arc<ExporterConfig>,
}

impl AppState {
    pub fn new(collector: DataStreamCollector, config: ExporterConfig) -> Self {
        Self {
            collector: Arc::new(collector),
            config: Arc::new(config),
        }
    }
}
