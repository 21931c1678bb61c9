//! Application-wide error types.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// What a user can do about a failure.
///
/// Every failure means nothing was written; the class tells the user whether to
/// correct the input, retry later, or escalate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Nothing happened, fix your input.
    FixInput,
    /// Nothing happened, try again.
    TryAgain,
    /// Something is misconfigured, contact an administrator.
    ContactAdministrator,
}

impl ErrorClass {
    /// Returns a user-facing sentence for this class.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::FixInput => "Nothing was saved. Please correct the highlighted input.",
            Self::TryAgain => "Nothing was saved. Please try again.",
            Self::ContactAdministrator => {
                "Nothing was saved. Something is misconfigured, please contact an administrator."
            }
        }
    }
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Access denied.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule violation.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Conflict (e.g., a change request is already pending).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Transient contention that outlived the retry budget.
    #[error("Temporarily unavailable: {0}")]
    Transient(String),

    /// Deployment or schema problem (e.g., a missing index).
    #[error("Misconfigured: {0}")]
    Misconfigured(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::BusinessRule(_) => 422,
            Self::Conflict(_) | Self::Transient(_) => 409,
            Self::Misconfigured(_) | Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Transient(_) => "TRANSIENT",
            Self::Misconfigured(_) => "MISCONFIGURED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns what the user can do about this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Forbidden(_)
            | Self::NotFound(_)
            | Self::Validation(_)
            | Self::BusinessRule(_)
            | Self::Conflict(_) => ErrorClass::FixInput,
            Self::Transient(_) => ErrorClass::TryAgain,
            Self::Misconfigured(_) | Self::Database(_) | Self::Internal(_) => {
                ErrorClass::ContactAdministrator
            }
        }
    }
}
