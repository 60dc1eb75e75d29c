//! Cache synchronizer: materializes committed store rows into the cache.
//!
//! Runs after every committed mutation for the affected ids, and on demand
//! for a single id or a full resync. Each invocation batches its writes
//! into one pipelined cache operation. Postcondition: refreshed entries
//! equal the just-committed store state.

use motorid_core::PersonId;
use motorid_storage::{PersonStore, SnapshotCache};

use crate::WorkerError;

/// Refresh the cache entries for specific ids after a commit.
///
/// Ids whose rows are gone or soft-deleted by now are skipped; the next
/// full resync drops their entries.
pub async fn refresh_ids(
    store: &dyn PersonStore,
    cache: &dyn SnapshotCache,
    ids: &[PersonId],
) -> Result<usize, WorkerError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let rows = store.get_active_many(ids).await?;
    cache.put_many(&rows).await?;
    Ok(rows.len())
}

/// On-demand refresh: one id, or a full resync when no id is given.
///
/// A full resync replaces the whole hash (clear, then one batched write),
/// so entries for soft-deleted persons stop being addressable.
pub async fn refresh(
    store: &dyn PersonStore,
    cache: &dyn SnapshotCache,
    target: Option<PersonId>,
) -> Result<usize, WorkerError> {
    match target {
        Some(id) => {
            let refreshed = refresh_ids(store, cache, &[id]).await?;
            tracing::debug!(%id, refreshed, "cache refresh");
            Ok(refreshed)
        }
        None => {
            let rows = store.list_active().await?;
            cache.clear().await?;
            cache.put_many(&rows).await?;
            tracing::info!(entries = rows.len(), "full cache resync");
            Ok(rows.len())
        }
    }
}
