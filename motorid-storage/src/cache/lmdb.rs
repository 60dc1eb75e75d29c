//! LMDB-backed snapshot cache.
//!
//! Uses the heed crate (Rust bindings for LMDB) for a memory-mapped cache
//! that survives process restarts. One named database holds the person
//! hash: key = the person id's 16 raw uuid bytes, value = the encoded
//! snapshot. A `put_many` batch runs in a single write transaction, which
//! is the pipelined-write boundary the synchronizer relies on.

use std::path::Path;

use async_trait::async_trait;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use motorid_core::{CacheError, Person, PersonId};

use super::traits::{decode_snapshot, encode_snapshot, SnapshotCache};

const PERSON_DB: &str = "persons";

/// Persistent snapshot cache.
pub struct LmdbSnapshotCache {
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl LmdbSnapshotCache {
    /// Open or create the cache environment.
    ///
    /// # Arguments
    ///
    /// * `path` - directory for the LMDB files
    /// * `max_size_mb` - map size ceiling in megabytes
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&path)
            .map_err(|e| CacheError::EnvOpen(e.to_string()))?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| CacheError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| CacheError::Transaction(e.to_string()))?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, Some(PERSON_DB))
            .map_err(|e| CacheError::EnvOpen(e.to_string()))?;
        wtxn.commit()
            .map_err(|e| CacheError::Transaction(e.to_string()))?;

        Ok(Self { env, db })
    }
}

#[async_trait]
impl SnapshotCache for LmdbSnapshotCache {
    async fn get(&self, id: PersonId) -> Result<Option<Person>, CacheError> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| CacheError::Transaction(e.to_string()))?;

        match self
            .db
            .get(&rtxn, id.as_bytes())
            .map_err(|e| CacheError::Transaction(e.to_string()))?
        {
            Some(bytes) => Ok(Some(decode_snapshot(bytes)?)),
            None => Ok(None),
        }
    }

    async fn put_many(&self, snapshots: &[Person]) -> Result<(), CacheError> {
        if snapshots.is_empty() {
            return Ok(());
        }

        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| CacheError::Transaction(e.to_string()))?;

        for person in snapshots {
            let bytes = encode_snapshot(person)?;
            self.db
                .put(&mut wtxn, person.id.as_bytes(), &bytes)
                .map_err(|e| CacheError::Transaction(e.to_string()))?;
        }

        wtxn.commit()
            .map_err(|e| CacheError::Transaction(e.to_string()))
    }

    async fn remove(&self, id: PersonId) -> Result<bool, CacheError> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| CacheError::Transaction(e.to_string()))?;

        let removed = self
            .db
            .delete(&mut wtxn, id.as_bytes())
            .map_err(|e| CacheError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| CacheError::Transaction(e.to_string()))?;
        Ok(removed)
    }

    async fn clear(&self) -> Result<u64, CacheError> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| CacheError::Transaction(e.to_string()))?;

        let removed = self
            .db
            .len(&wtxn)
            .map_err(|e| CacheError::Transaction(e.to_string()))?;
        self.db
            .clear(&mut wtxn)
            .map_err(|e| CacheError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| CacheError::Transaction(e.to_string()))?;
        Ok(removed)
    }

    async fn count(&self) -> Result<u64, CacheError> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| CacheError::Transaction(e.to_string()))?;
        self.db
            .len(&rtxn)
            .map_err(|e| CacheError::Transaction(e.to_string()))
    }
}
