use std::sync::Arc;

use health_insights_core::InsightEngine;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::store::{InMemoryRecordStore, RecordStore};

/// Shared state behind every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InsightEngine>,
    pub store: Arc<dyn RecordStore>,
    /// Present when a Prometheus recorder was installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(engine: InsightEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            store: Arc::new(InMemoryRecordStore::new()),
            metrics: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
