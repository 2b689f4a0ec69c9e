//! Shared application state for the connector.
//!
//! Owns the metrics aggregator for the whole process lifetime. The sync hook
//! and the HTTP handlers each get an `Arc` to the same instance.

use std::sync::Arc;

use tconnect_core::Metrics;

use crate::config::ConnectorConfig;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    metrics: Arc<Metrics>,
}

struct AppStateInner {
    cfg: ConnectorConfig,
}

impl AppState {
    pub fn new(cfg: ConnectorConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner { cfg }),
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn cfg(&self) -> &ConnectorConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }
}
