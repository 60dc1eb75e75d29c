//! MotorID Worker - Reconciliation Engine and Cache Synchronizer
//!
//! Consumes mutation commands from the channel mailbox, executes them as
//! database transactions, refreshes the cache for the affected ids, and
//! posts the correlated response. One logical command runs at a time per
//! worker instance; validation never reaches this layer, so every command
//! here has a well-formed shape.

pub mod db;
pub mod reconcile;
pub mod sync;

use std::sync::Arc;

use thiserror::Error;

use motorid_channel::{Command, CommandMailbox, ResponseMessage};
use motorid_core::{CacheError, PersonId, StorageError, ViewUpdate};
use motorid_storage::{PersonStore, SnapshotCache};

pub use db::{DbConfig, PgPersonStore};
pub use reconcile::{create_person_batch, BatchOutcome};

/// Failures crossing the worker's store/cache boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkerError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("cache refresh failed: {0}")]
    Cache(#[from] CacheError),
}

/// The backend worker: store writes plus cache refresh.
pub struct Worker {
    store: Arc<dyn PersonStore>,
    cache: Arc<dyn SnapshotCache>,
    mailbox: CommandMailbox,
}

impl Worker {
    pub fn new(
        store: Arc<dyn PersonStore>,
        cache: Arc<dyn SnapshotCache>,
        mailbox: CommandMailbox,
    ) -> Self {
        Self {
            store,
            cache,
            mailbox,
        }
    }

    /// Drain the mailbox until every gateway handle is gone.
    pub async fn run(mut self) {
        let completions = self.mailbox.responder();
        while let Some(msg) = self.mailbox.recv().await {
            tracing::info!(call_id = %msg.call_id, op = msg.command.name(), "executing command");
            let response = execute(self.store.as_ref(), self.cache.as_ref(), msg.command).await;
            if response.code >= 500 {
                tracing::error!(call_id = %msg.call_id, code = response.code, "command failed");
            }
            completions.complete(msg.call_id, response);
        }
        tracing::info!("command channel closed, worker stopping");
    }
}

/// Execute one command against the store and cache.
///
/// Exposed for in-process tests that bypass the channel.
pub async fn execute(
    store: &dyn PersonStore,
    cache: &dyn SnapshotCache,
    command: Command,
) -> ResponseMessage {
    match command {
        Command::CreatePerson { drafts } => create_person(store, cache, &drafts).await,
        Command::UpdateViews { updates } => update_views(store, cache, &updates).await,
        Command::SetVerified { identity_no, flag } => {
            set_verified(store, cache, &identity_no, flag).await
        }
        Command::Refresh { id } => match sync::refresh(store, cache, id).await {
            Ok(_) => ResponseMessage::ok_message("Success"),
            Err(err) => ResponseMessage::error(500, err.to_string()),
        },
    }
}

async fn create_person(
    store: &dyn PersonStore,
    cache: &dyn SnapshotCache,
    drafts: &[motorid_core::PersonDraft],
) -> ResponseMessage {
    let outcome = match reconcile::create_person_batch(store, drafts).await {
        Ok(outcome) => outcome,
        Err(err) if err.is_conflict() => return ResponseMessage::error(409, err.to_string()),
        Err(err) => return internal_failure("createPerson", err),
    };

    if let Err(err) = sync::refresh_ids(store, cache, &outcome.refresh_ids).await {
        return internal_failure("createPerson cache refresh", err);
    }

    match serde_json::to_value(&outcome.summaries) {
        Ok(data) => ResponseMessage::ok(data),
        Err(err) => internal_failure("createPerson response", err),
    }
}

async fn update_views(
    store: &dyn PersonStore,
    cache: &dyn SnapshotCache,
    updates: &[ViewUpdate],
) -> ResponseMessage {
    let mut updated: Vec<PersonId> = Vec::with_capacity(updates.len());

    // Each element is its own transaction boundary: earlier commits stand
    // even when a later element fails.
    for update in updates {
        match store.get_active(update.pid).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return ResponseMessage::error(404, format!("Person {} not found", update.pid))
            }
            Err(err) => return internal_failure("updateViews", err),
        }

        let staged = async {
            let mut tx = store.begin().await?;
            match tx.update_views(update).await {
                Ok(()) => tx.commit().await,
                Err(err) => {
                    if let Err(rb) = tx.rollback().await {
                        tracing::warn!(error = %rb, "rollback failed");
                    }
                    Err(err)
                }
            }
        };
        if let Err(err) = staged.await {
            return internal_failure("updateViews", err);
        }

        if let Err(err) = sync::refresh_ids(store, cache, &[update.pid]).await {
            return internal_failure("updateViews cache refresh", err);
        }
        updated.push(update.pid);
    }

    match serde_json::to_value(&updated) {
        Ok(data) => ResponseMessage::ok(data),
        Err(err) => internal_failure("updateViews response", err),
    }
}

async fn set_verified(
    store: &dyn PersonStore,
    cache: &dyn SnapshotCache,
    identity_no: &str,
    flag: bool,
) -> ResponseMessage {
    let person = match store.get_active_by_identity_no(identity_no).await {
        Ok(Some(person)) => person,
        Ok(None) => {
            return ResponseMessage::error(
                404,
                format!("Person not found for identity_no {identity_no}"),
            )
        }
        Err(err) => return internal_failure("setPersonVerified", err),
    };

    let staged = async {
        let mut tx = store.begin().await?;
        match tx.set_verified(identity_no, flag).await {
            Ok(()) => tx.commit().await,
            Err(err) => {
                if let Err(rb) = tx.rollback().await {
                    tracing::warn!(error = %rb, "rollback failed");
                }
                Err(err)
            }
        }
    };
    if let Err(err) = staged.await {
        return internal_failure("setPersonVerified", err);
    }

    if let Err(err) = sync::refresh_ids(store, cache, &[person.id]).await {
        return internal_failure("setPersonVerified cache refresh", err);
    }

    ResponseMessage::ok_message("Success")
}

fn internal_failure(context: &str, err: impl std::fmt::Display) -> ResponseMessage {
    tracing::error!(context, error = %err, "worker operation failed");
    ResponseMessage::error(500, format!("{context} failed"))
}
