/// Error types for entity operations
///
/// Entity operations return [`ModelResult`]. Callers are expected to branch on
/// the variant:
///
/// - `Validation`: re-render the form with the grouped field messages. Unique
///   and foreign-key violations reported by a store end up here too, keyed to
///   the conflicting field.
/// - `NotFound`: the looked-up record doesn't exist; respond with a not-found
///   status and a generic error view.
/// - `Password` / `Database`: unexpected failures, propagated as-is.
///
/// # Example
///
/// ```
/// use taskboard_core::error::ModelError;
/// use taskboard_core::validation::FieldErrors;
///
/// let err = ModelError::from(FieldErrors::single("name", "The field should be filled"));
/// assert!(err.field_errors().is_some());
/// assert_eq!(err.to_string(), "Validation failed: name: The field should be filled");
/// ```

use crate::auth::password::PasswordError;
use crate::validation::{unique_message, FieldErrors, REFERENCE_MESSAGE};

/// Result type alias for entity operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Unified error type for entity operations
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// One or more fields failed validation
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Lookup by id found nothing
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// Password transform failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Store round-trip failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<FieldErrors> for ModelError {
    fn from(errors: FieldErrors) -> Self {
        ModelError::Validation(errors)
    }
}

impl ModelError {
    /// Validation error for a value that already exists
    pub fn unique_violation(field: &str) -> Self {
        ModelError::Validation(FieldErrors::single(field, unique_message(field)))
    }

    /// Validation error for a reference to a missing record
    pub fn dangling_reference(field: &str) -> Self {
        ModelError::Validation(FieldErrors::single(field, REFERENCE_MESSAGE))
    }

    pub fn not_found(entity: &'static str, id: i32) -> Self {
        ModelError::NotFound { entity, id }
    }

    /// Grouped field messages, if this is a validation failure
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ModelError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::NotFound { .. })
    }
}
