//! Request counters reported by the health endpoint

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    feeds_served: AtomicU64,
    feeds_rejected: AtomicU64,
    episodes_served: AtomicU64,
    episodes_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed_served(&self) {
        self.feeds_served.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "feeds_served", "Metric incremented");
    }

    pub fn feed_rejected(&self) {
        self.feeds_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "feeds_rejected", "Metric incremented");
    }

    pub fn episode_served(&self) {
        self.episodes_served.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "episodes_served", "Metric incremented");
    }

    pub fn episode_failed(&self) {
        self.episodes_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "episodes_failed", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            feeds_served: self.feeds_served.load(Ordering::Relaxed),
            feeds_rejected: self.feeds_rejected.load(Ordering::Relaxed),
            episodes_served: self.episodes_served.load(Ordering::Relaxed),
            episodes_failed: self.episodes_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub feeds_served: u64,
    pub feeds_rejected: u64,
    pub episodes_served: u64,
    pub episodes_failed: u64,
}
