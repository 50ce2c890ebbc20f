//! Errors shared by every record type.

use thiserror::Error;

/// Shorthand result for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Failure raised by record constructors and state transitions.
///
/// Everything here is deterministic business logic; storage and sync
/// carry their own error types and never map into this one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input rejected before it became a record (blank name, empty sale).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A transition that would corrupt an existing record, such as
    /// overdrawing stock or overpaying a debt.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A string that does not parse as one of the id newtypes.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The record a transition targets is missing from the store.
    #[error("not found")]
    NotFound,

    /// The signed-in role is not allowed to do this.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
}
