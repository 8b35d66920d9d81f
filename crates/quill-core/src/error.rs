//! Domain-level error types.

use thiserror::Error;

/// Domain errors - business logic failures.
///
/// Every operation surfaces one of these; no failure is fatal to the
/// process.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("Caller does not own this resource")]
    Forbidden,

    #[error("Operation requires an authenticated caller")]
    Unauthenticated,

    #[error("Name already in use: {0}")]
    DuplicateName(String),

    #[error("Slug already in use: {0}")]
    DuplicateSlug(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Concurrent write conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Unique constraint violated on {0}")]
    Unique(&'static str),
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => DomainError::NotFound { entity: "record" },
            RepoError::Unique(field) => {
                DomainError::Conflict(format!("unique constraint violated on {field}"))
            }
            RepoError::Connection(msg) | RepoError::Query(msg) => DomainError::Internal(msg),
        }
    }
}
