use thiserror::Error;

use crate::persistence::PersistenceError;

/// A candidate record broke one of the catalog's field rules.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("invalid field `{field}`: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn missing(field: &'static str) -> Self {
        Self {
            field,
            reason: "is required".to_string(),
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by a resource store and the clients talking to it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Actor communication error: {0}")]
    ActorCommunication(String),
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        StoreError::Persistence(err.to_string())
    }
}
