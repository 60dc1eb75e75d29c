//! Read-optimized snapshot cache for person records.
//!
//! The cache is one hash structure: field key = person id, value = a
//! serialized full-row snapshot (binary-safe JSON, nulls preserved). It is
//! never the source of truth; the worker rewrites entries after every
//! committed store mutation, and a full resync replaces the whole map so
//! soft-deleted rows stop being addressable.
//!
//! `put_many` is the batching boundary: one call is one pipelined write
//! (a single LMDB write transaction in the persistent backend). That batch
//! is an efficiency boundary, not an atomicity one - each field write is
//! independently idempotent and keyed by id.

pub mod lmdb;
pub mod memory;
pub mod traits;

pub use lmdb::LmdbSnapshotCache;
pub use memory::InMemorySnapshotCache;
pub use traits::{decode_snapshot, encode_snapshot, SnapshotCache};
