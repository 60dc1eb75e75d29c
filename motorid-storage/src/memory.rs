//! In-memory mock store for tests and local development.
//!
//! Transactions take a snapshot of the committed map, log their operations,
//! and replay the log onto the current committed state at commit under the
//! write lock. Replay validates the `identity_no` uniqueness constraint the
//! same way the database index would: a concurrent insert that landed after
//! `begin` turns the losing commit into [`StorageError::Conflict`], and a
//! failed replay leaves the committed map untouched.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use motorid_core::{Person, PersonId, StorageError, StorageResult, ViewUpdate};

use crate::store::{PersonStore, PersonTx};

type Rows = HashMap<PersonId, Person>;

/// Mock person store backed by a shared hash map.
#[derive(Clone, Default)]
pub struct MemoryPersonStore {
    rows: Arc<RwLock<Rows>>,
}

impl MemoryPersonStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a committed row directly, bypassing the transaction layer.
    /// Test seeding only.
    pub fn seed(&self, person: Person) {
        if let Ok(mut rows) = self.rows.write() {
            rows.insert(person.id, person);
        }
    }

    /// Flip the soft-delete flag on a committed row. Deletion happens out of
    /// band in production; tests use this to exercise exclusion rules.
    pub fn soft_delete(&self, id: PersonId) {
        if let Ok(mut rows) = self.rows.write() {
            if let Some(p) = rows.get_mut(&id) {
                p.deleted = true;
                p.updated_at = Utc::now();
            }
        }
    }

    fn read_rows(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, Rows>> {
        self.rows.read().map_err(|_| StorageError::TransactionFailed {
            reason: "store lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl PersonStore for MemoryPersonStore {
    async fn begin(&self) -> StorageResult<Box<dyn PersonTx + '_>> {
        let snapshot = self.read_rows()?.clone();
        Ok(Box::new(MemoryTx {
            rows: Arc::clone(&self.rows),
            snapshot,
            ops: Vec::new(),
        }))
    }

    async fn get_active(&self, id: PersonId) -> StorageResult<Option<Person>> {
        Ok(self.read_rows()?.get(&id).filter(|p| !p.deleted).cloned())
    }

    async fn get_active_by_identity_no(
        &self,
        identity_no: &str,
    ) -> StorageResult<Option<Person>> {
        let rows = self.read_rows()?;
        Ok(find_active(&rows, identity_no))
    }

    async fn get_active_many(&self, ids: &[PersonId]) -> StorageResult<Vec<Person>> {
        let rows = self.read_rows()?;
        Ok(ids
            .iter()
            .filter_map(|id| rows.get(id).filter(|p| !p.deleted).cloned())
            .collect())
    }

    async fn list_active(&self) -> StorageResult<Vec<Person>> {
        let mut active: Vec<Person> =
            self.read_rows()?.values().filter(|p| !p.deleted).cloned().collect();
        // v7 ids sort by creation time
        active.sort_by_key(|p| p.id);
        Ok(active)
    }
}

fn find_active(rows: &Rows, identity_no: &str) -> Option<Person> {
    rows.values()
        .find(|p| !p.deleted && p.identity_no == identity_no)
        .cloned()
}

#[derive(Debug, Clone)]
enum TxOp {
    Insert(Person),
    UpdateContact {
        id: PersonId,
        name: String,
        phone: Option<String>,
    },
    UpdateViews(ViewUpdate),
    SetVerified {
        identity_no: String,
        flag: bool,
    },
}

struct MemoryTx {
    rows: Arc<RwLock<Rows>>,
    snapshot: Rows,
    ops: Vec<TxOp>,
}

impl MemoryTx {
    fn stage(&mut self, op: TxOp) -> StorageResult<()> {
        apply_op(&mut self.snapshot, &op)?;
        self.ops.push(op);
        Ok(())
    }
}

#[async_trait]
impl PersonTx for MemoryTx {
    async fn find_by_identity_no(&mut self, identity_no: &str) -> StorageResult<Option<Person>> {
        Ok(find_active(&self.snapshot, identity_no))
    }

    async fn insert(&mut self, person: &Person) -> StorageResult<()> {
        self.stage(TxOp::Insert(person.clone()))
    }

    async fn update_contact(
        &mut self,
        id: PersonId,
        name: &str,
        phone: Option<&str>,
    ) -> StorageResult<()> {
        self.stage(TxOp::UpdateContact {
            id,
            name: name.to_string(),
            phone: phone.map(str::to_string),
        })
    }

    async fn update_views(&mut self, update: &ViewUpdate) -> StorageResult<()> {
        self.stage(TxOp::UpdateViews(update.clone()))
    }

    async fn set_verified(&mut self, identity_no: &str, flag: bool) -> StorageResult<()> {
        self.stage(TxOp::SetVerified {
            identity_no: identity_no.to_string(),
            flag,
        })
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let mut rows = self.rows.write().map_err(|_| StorageError::TransactionFailed {
            reason: "store lock poisoned".to_string(),
        })?;

        // Replay onto the live state: all ops apply, or none do.
        let mut next = rows.clone();
        for op in &self.ops {
            apply_op(&mut next, op)?;
        }
        *rows = next;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }
}

fn apply_op(rows: &mut Rows, op: &TxOp) -> StorageResult<()> {
    match op {
        TxOp::Insert(person) => {
            if rows
                .values()
                .any(|p| !p.deleted && p.identity_no == person.identity_no)
            {
                return Err(StorageError::Conflict {
                    identity_no: person.identity_no.clone(),
                });
            }
            rows.insert(person.id, person.clone());
            Ok(())
        }
        TxOp::UpdateContact { id, name, phone } => {
            let row = rows
                .get_mut(id)
                .ok_or(StorageError::NotFound { id: *id })?;
            row.name = name.clone();
            row.phone = phone.clone();
            row.updated_at = Utc::now();
            Ok(())
        }
        TxOp::UpdateViews(update) => {
            let row = rows
                .get_mut(&update.pid)
                .ok_or(StorageError::NotFound { id: update.pid })?;
            merge_view(&mut row.identity_frontal_view, &update.identity_frontal_view);
            merge_view(&mut row.identity_rear_view, &update.identity_rear_view);
            merge_view(&mut row.license_frontal_view, &update.license_frontal_view);
            row.updated_at = Utc::now();
            Ok(())
        }
        TxOp::SetVerified { identity_no, flag } => {
            let row = rows
                .values_mut()
                .find(|p| !p.deleted && &p.identity_no == identity_no)
                .ok_or_else(|| StorageError::IdentityNotFound {
                    identity_no: identity_no.clone(),
                })?;
            row.verified = *flag;
            row.updated_at = Utc::now();
            Ok(())
        }
    }
}

fn merge_view(current: &mut Option<String>, incoming: &Option<String>) {
    if let Some(value) = incoming {
        if !value.trim().is_empty() {
            *current = Some(value.clone());
        }
    }
}
