//! Create-or-merge reconciliation for person batches.
//!
//! The whole batch runs in one transaction: any failure rolls everything
//! back, so partial application of a multi-person batch is never
//! observable. The existence-check-then-insert sequence is not atomic at
//! this level; when two workers race on the same new `identity_no`, the
//! store's uniqueness constraint turns the losing insert into
//! [`StorageError::Conflict`], which callers surface rather than swallow.

use motorid_core::{new_person_id, Person, PersonDraft, PersonId, PersonSummary, StorageResult};
use motorid_storage::{PersonStore, PersonTx};

/// Result of one committed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// One summary per input record, in input order.
    pub summaries: Vec<PersonSummary>,
    /// Ids whose rows changed and need a cache refresh. Verified records
    /// left untouched are not listed.
    pub refresh_ids: Vec<PersonId>,
}

/// Run the create-or-merge decision for every draft inside one transaction.
pub async fn create_person_batch(
    store: &dyn PersonStore,
    drafts: &[PersonDraft],
) -> StorageResult<BatchOutcome> {
    let mut tx = store.begin().await?;

    let staged = reconcile_all(tx.as_mut(), drafts).await;
    match staged {
        Ok(mut outcome) => {
            tx.commit().await?;
            outcome.refresh_ids.sort_unstable();
            outcome.refresh_ids.dedup();
            Ok(outcome)
        }
        Err(err) => {
            if let Err(rb) = tx.rollback().await {
                tracing::warn!(error = %rb, "rollback failed after batch error");
            }
            Err(err)
        }
    }
}

async fn reconcile_all(
    tx: &mut (dyn PersonTx + '_),
    drafts: &[PersonDraft],
) -> StorageResult<BatchOutcome> {
    let mut summaries = Vec::with_capacity(drafts.len());
    let mut refresh_ids = Vec::new();

    for draft in drafts {
        match tx.find_by_identity_no(&draft.identity_no).await? {
            None => {
                let person = Person::from_draft(new_person_id(), draft);
                tx.insert(&person).await?;
                tracing::debug!(id = %person.id, identity_no = %person.identity_no, "created person");
                refresh_ids.push(person.id);
                summaries.push(person.summary());
            }
            Some(existing) if !existing.verified => {
                let phone = draft.phone.as_deref().or(existing.phone.as_deref());
                tx.update_contact(existing.id, &draft.name, phone).await?;
                tracing::debug!(id = %existing.id, "merged unverified person");
                refresh_ids.push(existing.id);
                summaries.push(PersonSummary {
                    id: existing.id,
                    name: draft.name.clone(),
                    identity_no: existing.identity_no.clone(),
                });
            }
            Some(existing) => {
                // Verified identity data is locked against bulk overwrite.
                summaries.push(existing.summary());
            }
        }
    }

    Ok(BatchOutcome {
        summaries,
        refresh_ids,
    })
}
