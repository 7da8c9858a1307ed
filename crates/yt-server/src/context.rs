//! Service-oriented application context.
//!
//! [`AppContext`] is the central struct shared across all route handlers via
//! Axum state. Every service is constructed once here and injected; handlers
//! never reach for globals or re-read the environment.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use yt_core::config::Config;
use yt_core::{JobStore, NotificationHub};
use yt_extract::Extractor;

use crate::scheduler::Scheduler;

/// Shared state for handlers and background tasks. Cheap to clone.
#[derive(Clone)]
pub struct AppContext {
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// All job records.
    pub store: Arc<JobStore>,
    /// Per-job event fan-out feeding the SSE streams.
    pub hub: NotificationHub,
    /// The single-worker conversion queue.
    pub scheduler: Scheduler,
    /// Strategy used for conversions and metadata lookups.
    pub extractor: Arc<dyn Extractor>,
    /// Cancelled on shutdown; open event streams end when it fires.
    pub shutdown: CancellationToken,
}

impl AppContext {
    /// Wire up store, hub and scheduler around an already-built extractor.
    pub fn new(config: Config, extractor: Arc<dyn Extractor>) -> Self {
        let store = Arc::new(JobStore::new(config.output_dir()));
        let hub = NotificationHub::new();
        let scheduler = Scheduler::new(Arc::clone(&store), hub.clone(), Arc::clone(&extractor));
        Self {
            config: Arc::new(config),
            store,
            hub,
            scheduler,
            extractor,
            shutdown: CancellationToken::new(),
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("extractor", &self.extractor.name())
            .field("jobs", &self.store.len())
            .field("hub", &self.hub)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
