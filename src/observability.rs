//! Tracing setup and in-process counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

/// Filter used while configuration is still loading
pub const BOOTSTRAP_FILTER: &str = "livedoc=info";

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install the global fmt subscriber
///
/// `RUST_LOG` wins over the configured filter when set.
pub fn init_tracing(default_filter: &str) {
    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .try_init();
}

/// Scoped subscriber for startup work that runs before [`init_tracing`]
///
/// Use with `tracing::subscriber::with_default` so events emitted while the
/// configuration loads are not lost.
pub fn bootstrap_subscriber() -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(BOOTSTRAP_FILTER))
        .finish()
}

/// Counters for the document endpoints
#[derive(Debug, Default)]
pub struct Metrics {
    conversions_ok: AtomicU64,
    conversions_failed: AtomicU64,
    documents_fetched: AtomicU64,
    documents_stored: AtomicU64,
    updates_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversion_ok(&self) {
        self.conversions_ok.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "conversions_ok", "Metric incremented");
    }

    pub fn conversion_failed(&self) {
        self.conversions_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "conversions_failed", "Metric incremented");
    }

    pub fn document_fetched(&self) {
        self.documents_fetched.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "documents_fetched", "Metric incremented");
    }

    pub fn document_stored(&self) {
        self.documents_stored.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "documents_stored", "Metric incremented");
    }

    pub fn update_failed(&self) {
        self.updates_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "updates_failed", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            conversions_ok: self.conversions_ok.load(Ordering::Relaxed),
            conversions_failed: self.conversions_failed.load(Ordering::Relaxed),
            documents_fetched: self.documents_fetched.load(Ordering::Relaxed),
            documents_stored: self.documents_stored.load(Ordering::Relaxed),
            updates_failed: self.updates_failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time counter values, reported by `/health`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub conversions_ok: u64,
    pub conversions_failed: u64,
    pub documents_fetched: u64,
    pub documents_stored: u64,
    pub updates_failed: u64,
}
