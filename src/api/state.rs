use std::sync::Arc;

use tokio_util::task::TaskTracker;

use crate::config::Config;
use crate::gate::{AvailabilityGate, StatusSource};
use crate::index::{AuditSink, SearchIndex, SqliteIndex};
use crate::observability::Metrics;
use crate::resolver::Resolver;
use crate::storage::{ContentStore, StoreLayout};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: Resolver,
    pub index: Arc<dyn SearchIndex>,
    pub audit: Arc<dyn AuditSink>,
    pub gate: AvailabilityGate,
    pub metrics: Arc<Metrics>,
    /// Background audit writes, drained on shutdown
    pub audits: TaskTracker,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn ContentStore>,
        index: Arc<dyn SearchIndex>,
        status: Arc<dyn StatusSource>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let resolver = Resolver::new(store, StoreLayout::new(config.content_store.tag.clone()));
        let gate = AvailabilityGate::new(status, config.gate_policy());

        Self {
            config: Arc::new(config),
            resolver,
            index,
            audit,
            gate,
            metrics: Arc::new(Metrics::new()),
            audits: TaskTracker::new(),
        }
    }

    /// One SQLite index serving search, status and audit
    pub fn with_sqlite(config: Config, store: Arc<dyn ContentStore>, index: SqliteIndex) -> Self {
        let index = Arc::new(index);
        Self::new(config, store, index.clone(), index.clone(), index)
    }
}
