//! In-memory snapshot cache for tests and single-process deployments.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use motorid_core::{CacheError, Person, PersonId};

use super::traits::{decode_snapshot, encode_snapshot, SnapshotCache};

/// Hash-map backed cache storing the same encoded snapshots the persistent
/// backend would, so encoding bugs surface in unit tests too.
#[derive(Default)]
pub struct InMemorySnapshotCache {
    entries: RwLock<HashMap<PersonId, Vec<u8>>>,
}

impl InMemorySnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(_: impl std::fmt::Debug) -> CacheError {
    CacheError::Transaction("cache lock poisoned".to_string())
}

#[async_trait]
impl SnapshotCache for InMemorySnapshotCache {
    async fn get(&self, id: PersonId) -> Result<Option<Person>, CacheError> {
        let entries = self.entries.read().map_err(poisoned)?;
        entries.get(&id).map(|bytes| decode_snapshot(bytes)).transpose()
    }

    async fn put_many(&self, snapshots: &[Person]) -> Result<(), CacheError> {
        let encoded: Vec<(PersonId, Vec<u8>)> = snapshots
            .iter()
            .map(|p| Ok((p.id, encode_snapshot(p)?)))
            .collect::<Result<_, CacheError>>()?;

        let mut entries = self.entries.write().map_err(poisoned)?;
        for (id, bytes) in encoded {
            entries.insert(id, bytes);
        }
        Ok(())
    }

    async fn remove(&self, id: PersonId) -> Result<bool, CacheError> {
        Ok(self.entries.write().map_err(poisoned)?.remove(&id).is_some())
    }

    async fn clear(&self) -> Result<u64, CacheError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let removed = entries.len() as u64;
        entries.clear();
        Ok(removed)
    }

    async fn count(&self) -> Result<u64, CacheError> {
        Ok(self.entries.read().map_err(poisoned)?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motorid_core::{new_person_id, PersonDraft};

    fn person(name: &str, identity_no: &str) -> Person {
        Person::from_draft(
            new_person_id(),
            &PersonDraft {
                name: name.to_string(),
                identity_no: identity_no.to_string(),
                phone: None,
                email: None,
                address: None,
            },
        )
    }

    #[tokio::test]
    async fn put_many_then_get() -> Result<(), CacheError> {
        let cache = InMemorySnapshotCache::new();
        let a = person("A", "X1");
        let b = person("B", "X2");

        cache.put_many(&[a.clone(), b.clone()]).await?;
        assert_eq!(cache.count().await?, 2);
        assert_eq!(cache.get(a.id).await?.as_ref(), Some(&a));
        assert_eq!(cache.get(b.id).await?.as_ref(), Some(&b));
        Ok(())
    }

    #[tokio::test]
    async fn put_replaces_whole_snapshot() -> Result<(), CacheError> {
        let cache = InMemorySnapshotCache::new();
        let mut p = person("A", "X1");
        cache.put_many(std::slice::from_ref(&p)).await?;

        p.name = "A2".to_string();
        p.phone = Some("111".to_string());
        cache.put_many(std::slice::from_ref(&p)).await?;

        let cached = cache.get(p.id).await?.expect("entry");
        assert_eq!(cached.name, "A2");
        assert_eq!(cached.phone.as_deref(), Some("111"));
        assert_eq!(cache.count().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn remove_and_clear() -> Result<(), CacheError> {
        let cache = InMemorySnapshotCache::new();
        let a = person("A", "X1");
        let b = person("B", "X2");
        cache.put_many(&[a.clone(), b]).await?;

        assert!(cache.remove(a.id).await?);
        assert!(!cache.remove(a.id).await?);
        assert_eq!(cache.clear().await?, 1);
        assert_eq!(cache.count().await?, 0);
        Ok(())
    }
}
