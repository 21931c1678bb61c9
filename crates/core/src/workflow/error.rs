//! Workflow error types.

use khata_shared::AppError;
use khata_shared::types::{LedgerEntryId, UpdateRequestId, UserId};
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::store::StoreError;
use crate::workflow::types::RequestStatus;

/// Errors raised by the approval workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The request is not pending.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: RequestStatus,
        /// The attempted target status.
        to: RequestStatus,
    },

    /// Only privileged users resolve requests.
    #[error("User {user_id} is not authorized to resolve change requests")]
    NotAuthorizedToResolve {
        /// The user who attempted it.
        user_id: UserId,
    },

    /// The entry changed after the request was made.
    #[error("Entry {entry_id} changed after request {request_id} was made")]
    StaleRequest {
        /// The request.
        request_id: UpdateRequestId,
        /// The entry that moved on.
        entry_id: LedgerEntryId,
    },

    /// An update request without replacement data.
    #[error("Update request {0} carries no replacement data")]
    MissingUpdateData(UpdateRequestId),

    /// The ledger engine refused the change.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. } | Self::MissingUpdateData(_) => 400,
            Self::NotAuthorizedToResolve { .. } => 403,
            Self::StaleRequest { .. } => 409,
            Self::Ledger(inner) => inner.http_status_code(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotAuthorizedToResolve { .. } => "NOT_AUTHORIZED_TO_RESOLVE",
            Self::StaleRequest { .. } => "STALE_REQUEST",
            Self::MissingUpdateData(_) => "MISSING_UPDATE_DATA",
            Self::Ledger(inner) => inner.error_code(),
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Ledger(inner) if inner.is_retryable())
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        Self::Ledger(LedgerError::from(err))
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Ledger(inner) => inner.into(),
            WorkflowError::InvalidTransition { .. } | WorkflowError::StaleRequest { .. } => {
                Self::Conflict(err.to_string())
            }
            WorkflowError::NotAuthorizedToResolve { .. } => Self::Forbidden(err.to_string()),
            WorkflowError::MissingUpdateData(_) => Self::Validation(err.to_string()),
        }
    }
}
