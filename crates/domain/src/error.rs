//! Domain error type shared by the manager services.

use thiserror::Error;

use crate::stores::StoreError;

/// Errors produced by the manager services.
///
/// The HTTP layer maps each variant onto a status code; services never
/// construct responses themselves.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
            })
            .collect();
        DomainError::Validation(messages.join("; "))
    }
}

impl From<validator::ValidationError> for DomainError {
    fn from(error: validator::ValidationError) -> Self {
        let message = error
            .message
            .clone()
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("Invalid value: {}", error.code));
        DomainError::Validation(message)
    }
}
