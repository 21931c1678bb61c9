//! Store error types.

use thiserror::Error;

/// Errors raised by a [`LedgerStore`](super::LedgerStore) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A record read by the transaction changed before the commit.
    #[error("Record {key} changed since it was read")]
    Conflict {
        /// Display form of the conflicting record key.
        key: String,
    },

    /// The query needs a composite index the store does not declare.
    #[error("Query on {collection} requires a composite index on ({fields})")]
    IndexRequired {
        /// Collection being queried.
        collection: String,
        /// Comma separated list of indexed fields.
        fields: String,
    },

    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A stored body could not be decoded into its record type.
    #[error("Record {key} is corrupt: {reason}")]
    Corrupt {
        /// Display form of the record key.
        key: String,
        /// Decoder message.
        reason: String,
    },
}

impl StoreError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Conflict { .. } => "STORE_CONFLICT",
            Self::IndexRequired { .. } => "INDEX_REQUIRED",
            Self::Unavailable(_) => "STORE_UNAVAILABLE",
            Self::Corrupt { .. } => "STORE_CORRUPT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Conflict { .. } => 409,
            Self::Unavailable(_) => 503,
            Self::IndexRequired { .. } | Self::Corrupt { .. } => 500,
        }
    }

    /// Returns true if rerunning the whole operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflicts_are_retryable() {
        assert!(
            StoreError::Conflict {
                key: "products/1".into()
            }
            .is_retryable()
        );
        assert!(!StoreError::Unavailable("down".into()).is_retryable());
        assert!(
            !StoreError::IndexRequired {
                collection: "ledger_entries".into(),
                fields: "date, type".into(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_index_required_display_names_fields() {
        let err = StoreError::IndexRequired {
            collection: "ledger_entries".into(),
            fields: "entityId, type, paymentStatus".into(),
        };
        assert_eq!(
            err.to_string(),
            "Query on ledger_entries requires a composite index on (entityId, type, paymentStatus)"
        );
        assert_eq!(err.error_code(), "INDEX_REQUIRED");
    }
}
