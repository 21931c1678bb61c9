//! Query error types.

use khata_shared::AppError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors raised by the query layer.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The viewer may not see this data.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The store lacks a composite index the query needs.
    #[error("Query on {collection} requires a composite index on ({fields})")]
    IndexRequired {
        /// Collection queried.
        collection: String,
        /// Indexed fields.
        fields: String,
    },

    /// The store failed.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ReportError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::IndexRequired { .. } => "INDEX_REQUIRED",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::PermissionDenied(_) => 403,
            Self::IndexRequired { .. } => 500,
            Self::StoreUnavailable(_) => 503,
        }
    }

    /// Reads are never retried automatically.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<StoreError> for ReportError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::IndexRequired { collection, fields } => {
                Self::IndexRequired { collection, fields }
            }
            StoreError::Unavailable(message) => Self::StoreUnavailable(message),
            other @ (StoreError::Conflict { .. } | StoreError::Corrupt { .. }) => {
                Self::StoreUnavailable(other.to_string())
            }
        }
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        let message = err.to_string();
        match err {
            ReportError::PermissionDenied(_) => Self::Forbidden(message),
            ReportError::IndexRequired { .. } => Self::Misconfigured(message),
            ReportError::StoreUnavailable(_) => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use khata_shared::ErrorClass;

    #[test]
    fn test_index_required_is_distinct() {
        let err = ReportError::from(StoreError::IndexRequired {
            collection: "ledger_entries".into(),
            fields: "date, type".into(),
        });
        assert_eq!(err.error_code(), "INDEX_REQUIRED");
        assert_eq!(
            err.to_string(),
            "Query on ledger_entries requires a composite index on (date, type)"
        );
        assert_eq!(AppError::from(err).class(), ErrorClass::ContactAdministrator);
    }

    #[test]
    fn test_unavailable_mapping() {
        let err = ReportError::from(StoreError::Unavailable("pool timed out".into()));
        assert_eq!(err.http_status_code(), 503);
        assert!(!err.is_retryable());
        assert!(matches!(AppError::from(err), AppError::Database(_)));
    }
}
