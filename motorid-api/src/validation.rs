//! Validation Traits
//!
//! Common validation patterns shared by the route handlers. Validation runs
//! before any command is published: a failure here is a pure no-op.

use crate::error::{ApiError, ApiResult};

/// Trait for validating non-empty strings.
pub trait ValidateNonEmpty {
    /// Validate that the value is non-empty.
    ///
    /// # Errors
    /// Returns `ApiError::missing_field` if the value is empty or whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

impl<T: ValidateNonEmpty> ValidateNonEmpty for Option<T> {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        match self {
            Some(value) => value.validate_non_empty(field_name),
            None => Err(ApiError::missing_field(field_name)),
        }
    }
}

/// Trait for validating non-empty batch payloads.
pub trait ValidateNonEmptyList {
    /// Validate that the batch has at least one element.
    fn validate_non_empty_list(&self, field_name: &str) -> ApiResult<()>;
}

impl<T> ValidateNonEmptyList for [T] {
    fn validate_non_empty_list(&self, field_name: &str) -> ApiResult<()> {
        if self.is_empty() {
            return Err(ApiError::invalid_input(format!(
                "{field_name} must be a non-empty list"
            )));
        }
        Ok(())
    }
}
