//! Core person record structures

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{PersonId, Timestamp};

/// Person - the identity record managed by the registry.
///
/// `id` is assigned once at creation and never reused; `identity_no` is the
/// natural key, unique among non-deleted persons (enforced by the store).
/// The cache holds full-row snapshots of this type, never a second source
/// of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Person {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: PersonId,
    pub identity_no: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub identity_frontal_view: Option<String>,
    pub identity_rear_view: Option<String>,
    pub license_frontal_view: Option<String>,
    pub verified: bool,
    pub deleted: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Person {
    /// Build a fresh unverified person from a draft with the given id.
    pub fn from_draft(id: PersonId, draft: &PersonDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            identity_no: draft.identity_no.clone(),
            name: draft.name.clone(),
            phone: draft.phone.clone(),
            email: draft.email.clone(),
            address: draft.address.clone(),
            identity_frontal_view: None,
            identity_rear_view: None,
            license_frontal_view: None,
            verified: false,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// The per-record result row returned by batch creation.
    pub fn summary(&self) -> PersonSummary {
        PersonSummary {
            id: self.id,
            name: self.name.clone(),
            identity_no: self.identity_no.clone(),
        }
    }
}

/// Incoming person record for batch creation.
///
/// Optional fields mean absent, never an empty-string placeholder. Document
/// image references are not part of the draft; they attach through view
/// updates only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PersonDraft {
    pub name: String,
    pub identity_no: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Targeted update of a person's document image references.
///
/// An absent or empty field keeps the stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ViewUpdate {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub pid: PersonId,
    #[serde(default)]
    pub identity_frontal_view: Option<String>,
    #[serde(default)]
    pub identity_rear_view: Option<String>,
    #[serde(default)]
    pub license_frontal_view: Option<String>,
}

impl ViewUpdate {
    /// True when at least one view field carries a non-empty value.
    pub fn has_any_view(&self) -> bool {
        [
            &self.identity_frontal_view,
            &self.identity_rear_view,
            &self.license_frontal_view,
        ]
        .iter()
        .any(|v| matches!(v, Some(s) if !s.trim().is_empty()))
    }
}

/// Per-record creation result, preserving input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PersonSummary {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: PersonId,
    pub name: String,
    pub identity_no: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_person_id;

    fn draft(name: &str, identity_no: &str) -> PersonDraft {
        PersonDraft {
            name: name.to_string(),
            identity_no: identity_no.to_string(),
            phone: None,
            email: None,
            address: None,
        }
    }

    #[test]
    fn from_draft_starts_unverified_and_undeleted() {
        let p = Person::from_draft(new_person_id(), &draft("A", "X1"));
        assert!(!p.verified);
        assert!(!p.deleted);
        assert_eq!(p.phone, None);
        assert_eq!(p.identity_frontal_view, None);
    }

    #[test]
    fn summary_preserves_identity_fields() {
        let p = Person::from_draft(new_person_id(), &draft("A", "X1"));
        let s = p.summary();
        assert_eq!(s.id, p.id);
        assert_eq!(s.name, "A");
        assert_eq!(s.identity_no, "X1");
    }

    #[test]
    fn view_update_requires_a_non_empty_view() {
        let mut u = ViewUpdate {
            pid: new_person_id(),
            identity_frontal_view: None,
            identity_rear_view: None,
            license_frontal_view: None,
        };
        assert!(!u.has_any_view());

        u.identity_rear_view = Some("  ".to_string());
        assert!(!u.has_any_view());

        u.license_frontal_view = Some("https://img/1.jpg".to_string());
        assert!(u.has_any_view());
    }

    #[test]
    fn draft_deserializes_with_absent_optionals() -> Result<(), serde_json::Error> {
        let d: PersonDraft = serde_json::from_str(r#"{"name":"A","identity_no":"X1"}"#)?;
        assert_eq!(d.phone, None);
        assert_eq!(d.email, None);
        Ok(())
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::new_person_id;
    use proptest::prelude::*;

    proptest! {
        // The cache stores serialized full-row snapshots; the encoding must
        // survive a round trip with nulls intact.
        #[test]
        fn person_snapshot_roundtrip(
            name in ".{0,24}",
            identity_no in "[A-Z0-9]{1,18}",
            phone in proptest::option::of("[0-9]{1,11}"),
            email in proptest::option::of("[a-z]{1,8}@[a-z]{1,8}\\.com"),
            verified in any::<bool>(),
        ) {
            let mut p = Person::from_draft(new_person_id(), &PersonDraft {
                name,
                identity_no,
                phone,
                email,
                address: None,
            });
            p.verified = verified;

            let bytes = serde_json::to_vec(&p).expect("serialize");
            let back: Person = serde_json::from_slice(&bytes).expect("deserialize");
            prop_assert_eq!(back, p);
        }
    }
}
