//! Transactional person store abstraction.
//!
//! The worker is the only writer; the gateway never touches this layer.
//! Implementations must exclude soft-deleted rows from every read and
//! enforce `identity_no` uniqueness among non-deleted rows - the constraint
//! is the authoritative conflict resolver when multiple workers race on the
//! same new identity.

use async_trait::async_trait;
use motorid_core::{Person, PersonId, StorageResult, ViewUpdate};

/// A unit of work against the person table.
///
/// Obtained from [`PersonStore::begin`]; every open transaction ends in
/// exactly one `commit` or `rollback`. Reads inside the transaction see its
/// own uncommitted writes.
#[async_trait]
pub trait PersonTx: Send {
    /// Look up a non-deleted person by natural key.
    async fn find_by_identity_no(&mut self, identity_no: &str) -> StorageResult<Option<Person>>;

    /// Insert a new person row.
    ///
    /// Returns [`motorid_core::StorageError::Conflict`] when the uniqueness
    /// constraint on `identity_no` fires (possibly only at commit time,
    /// depending on the backend).
    async fn insert(&mut self, person: &Person) -> StorageResult<()>;

    /// Overwrite `name` and `phone` on an existing row.
    async fn update_contact(
        &mut self,
        id: PersonId,
        name: &str,
        phone: Option<&str>,
    ) -> StorageResult<()>;

    /// Apply a view-field update; absent/empty fields keep the stored value.
    async fn update_views(&mut self, update: &ViewUpdate) -> StorageResult<()>;

    /// Set the verified flag, addressed by natural key.
    async fn set_verified(&mut self, identity_no: &str, flag: bool) -> StorageResult<()>;

    async fn commit(self: Box<Self>) -> StorageResult<()>;

    async fn rollback(self: Box<Self>) -> StorageResult<()>;
}

/// Source-of-truth store for person rows.
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Open a transaction.
    async fn begin(&self) -> StorageResult<Box<dyn PersonTx + '_>>;

    /// Read a non-deleted person by id.
    async fn get_active(&self, id: PersonId) -> StorageResult<Option<Person>>;

    /// Read a non-deleted person by natural key.
    async fn get_active_by_identity_no(&self, identity_no: &str)
        -> StorageResult<Option<Person>>;

    /// Read several non-deleted persons by id; missing ids are skipped.
    async fn get_active_many(&self, ids: &[PersonId]) -> StorageResult<Vec<Person>>;

    /// All non-deleted persons, for full cache resync.
    async fn list_active(&self) -> StorageResult<Vec<Person>>;
}
