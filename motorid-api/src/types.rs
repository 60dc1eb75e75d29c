//! API Request Types
//!
//! Batch creation and view updates reuse the core types directly
//! ([`motorid_core::PersonDraft`], [`motorid_core::ViewUpdate`]); the types
//! here cover the remaining operations.

use serde::{Deserialize, Serialize};

use motorid_core::PersonId;

/// Request to change a person's verification flag.
///
/// Once `flag` is true, the person's `name` and `phone` are locked against
/// overwrite by later batch submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SetVerifiedRequest {
    pub identity_no: String,
    pub flag: bool,
}

/// Request for an on-demand cache refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RefreshRequest {
    /// Refresh one person when set; full resync when absent.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub id: Option<PersonId>,
}
