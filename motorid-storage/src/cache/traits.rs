//! Snapshot cache trait and the snapshot wire encoding.

use async_trait::async_trait;
use motorid_core::{CacheError, Person, PersonId};

/// Backend-agnostic snapshot cache.
///
/// Implementations must support concurrent reads during writes; a write is
/// always a full-row replacement for its id, so last-writer-wins per entry
/// is acceptable.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Read one snapshot.
    async fn get(&self, id: PersonId) -> Result<Option<Person>, CacheError>;

    /// Write a batch of snapshots in one pipelined operation.
    async fn put_many(&self, snapshots: &[Person]) -> Result<(), CacheError>;

    /// Drop one entry. Returns whether it existed.
    async fn remove(&self, id: PersonId) -> Result<bool, CacheError>;

    /// Drop every entry, returning how many were removed.
    async fn clear(&self) -> Result<u64, CacheError>;

    /// Number of entries currently addressable.
    async fn count(&self) -> Result<u64, CacheError>;
}

/// Serialize a person row for cache storage.
pub fn encode_snapshot(person: &Person) -> Result<Vec<u8>, CacheError> {
    serde_json::to_vec(person).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Deserialize a cached person row.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Person, CacheError> {
    serde_json::from_slice(bytes).map_err(|e| CacheError::Deserialization(e.to_string()))
}
