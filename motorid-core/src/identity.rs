//! Identity types for MotorID entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Person identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation time.
pub type PersonId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 PersonId (timestamp-sortable).
pub fn new_person_id() -> PersonId {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_ids_are_unique_and_ordered() {
        let a = new_person_id();
        let b = new_person_id();
        assert_ne!(a, b);
        // v7 ids embed a timestamp in the leading bytes
        assert!(a.as_bytes()[..6] <= b.as_bytes()[..6]);
    }
}
