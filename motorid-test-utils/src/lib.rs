//! Test fixtures and the in-process harness for MotorID.
//!
//! The harness wires a memory store, a memory cache, the command channel,
//! and a spawned worker together, so integration tests exercise the same
//! dispatch path production uses without PostgreSQL or LMDB.

use std::sync::Arc;
use std::time::Duration;

use motorid_channel::{command_channel, CommandBus};
use motorid_core::{new_person_id, Person, PersonDraft};
use motorid_storage::{InMemorySnapshotCache, MemoryPersonStore, SnapshotCache};
use motorid_worker::Worker;

/// Minimal draft with only the required fields.
pub fn draft(name: &str, identity_no: &str) -> PersonDraft {
    PersonDraft {
        name: name.to_string(),
        identity_no: identity_no.to_string(),
        phone: None,
        email: None,
        address: None,
    }
}

/// Draft carrying a phone number.
pub fn draft_with_phone(name: &str, identity_no: &str, phone: &str) -> PersonDraft {
    PersonDraft {
        phone: Some(phone.to_string()),
        ..draft(name, identity_no)
    }
}

/// Committed unverified person row.
pub fn person_fixture(name: &str, identity_no: &str) -> Person {
    Person::from_draft(new_person_id(), &draft(name, identity_no))
}

/// Store + cache + channel + running worker.
pub struct TestStack {
    pub store: MemoryPersonStore,
    pub cache: Arc<InMemorySnapshotCache>,
    pub bus: CommandBus,
}

impl TestStack {
    /// The cache as the trait object the gateway state expects.
    pub fn shared_cache(&self) -> Arc<dyn SnapshotCache> {
        Arc::clone(&self.cache) as Arc<dyn SnapshotCache>
    }
}

/// Spawn a worker on the current runtime and hand back the connected stack.
pub fn spawn_test_stack() -> TestStack {
    spawn_test_stack_with_timeout(Duration::from_secs(5))
}

/// Same as [`spawn_test_stack`], with an explicit gateway wait window.
pub fn spawn_test_stack_with_timeout(timeout: Duration) -> TestStack {
    let store = MemoryPersonStore::new();
    let cache = Arc::new(InMemorySnapshotCache::new());
    let (bus, mailbox) = command_channel(32, timeout);

    let worker = Worker::new(
        Arc::new(store.clone()),
        Arc::clone(&cache) as Arc<dyn SnapshotCache>,
        mailbox,
    );
    tokio::spawn(worker.run());

    TestStack { store, cache, bus }
}
