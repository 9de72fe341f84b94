//! Tracing setup and request counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "recipegate=info,tower_http=info";

/// Install the global `fmt` subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    requests_admitted: AtomicU64,
    requests_rejected: AtomicU64,
    downloads_observed: AtomicU64,
    audit_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_admitted(&self) {
        self.requests_admitted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "requests_admitted", "Metric incremented");
    }

    pub fn request_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "requests_rejected", "Metric incremented");
    }

    pub fn download_observed(&self) {
        self.downloads_observed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "downloads_observed", "Metric incremented");
    }

    pub fn audit_failed(&self) {
        self.audit_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "audit_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_admitted: self.requests_admitted.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            downloads_observed: self.downloads_observed.load(Ordering::Relaxed),
            audit_failures: self.audit_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_admitted: u64,
    pub requests_rejected: u64,
    pub downloads_observed: u64,
    pub audit_failures: u64,
}
