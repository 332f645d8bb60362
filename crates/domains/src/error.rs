//! # AppError
//!
//! Centralized error handling for the relief exchange.
//! Maps domain-specific failures to actionable error types.

use std::fmt;

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Credential missing, malformed, expired or revoked.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Valid identity, but the policy refused the action.
    #[error("forbidden: {0}")]
    Forbidden(Denial),

    /// Resource not found (e.g., Donation, UserData)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Duplicate report, or an account that already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Validation failure (e.g., blank title, too many tags)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// A stored document is missing a field or holds the wrong type.
    #[error("data integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    /// Infrastructure failure (e.g., DB down, verifier unreachable)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(entity.to_string(), id.to_string())
    }
}

/// Why the policy refused an action.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    #[error("identity is banned")]
    Banned,
    #[error("caller is neither the owner nor an admin")]
    NotOwnerOrAdmin,
    #[error("caller is not an admin")]
    NotAdmin,
    #[error("admins cannot be banned")]
    TargetIsAdmin,
    #[error("user is already banned")]
    AlreadyBanned,
    #[error("callers may only delete their own account")]
    NotSelf,
    #[error("requested user is banned")]
    TargetBanned,
}

/// A stored document that does not match the expected schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{collection}/{id}: field `{field}` {problem}")]
pub struct IntegrityError {
    pub collection: String,
    pub id: String,
    pub field: String,
    pub problem: FieldProblem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProblem::Missing => f.write_str("is missing"),
            FieldProblem::WrongType { expected, found } => {
                write!(f, "should be {expected} but is {found}")
            }
        }
    }
}

/// A specialized Result type for relief exchange logic.
pub type Result<T> = std::result::Result<T, AppError>;
