//! Shared application state for Axum routers.

use std::sync::Arc;

use motorid_channel::CommandBus;
use motorid_storage::SnapshotCache;

/// Type alias for the cache handle shared across handlers.
///
/// Reads (`getPerson`) go straight to this cache and never block on the
/// worker; the worker owns every write to it.
pub type SharedCache = Arc<dyn SnapshotCache>;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Snapshot cache, read directly by lookups.
    pub cache: SharedCache,
    /// Command bus publishing mutations to the worker.
    pub bus: CommandBus,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(cache: SharedCache, bus: CommandBus) -> Self {
        Self {
            cache,
            bus,
            start_time: std::time::Instant::now(),
        }
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(SharedCache, cache);
crate::impl_from_ref!(CommandBus, bus);
crate::impl_from_ref!(std::time::Instant, start_time);
