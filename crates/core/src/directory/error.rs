//! Errors for the entity directory and product catalog.

use khata_shared::AppError;
use khata_shared::types::{CounterpartyId, ProductId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::store::StoreError;

/// Errors raised by the directory and catalog services.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Counterparty not found.
    #[error("Counterparty not found: {0}")]
    CounterpartyNotFound(CounterpartyId),

    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Name is empty after trimming.
    #[error("Name cannot be empty")]
    EmptyName,

    /// SKU is empty after trimming.
    #[error("SKU cannot be empty")]
    EmptySku,

    /// Unit price is negative.
    #[error("Price cannot be negative: {0}")]
    NegativePrice(Decimal),

    /// Opening stock is negative.
    #[error("Opening stock cannot be negative: {0}")]
    NegativeOpeningStock(i64),

    /// Concurrent modification outlived the retry budget.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    /// Backing store failure.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl DirectoryError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CounterpartyNotFound(_) => "COUNTERPARTY_NOT_FOUND",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::EmptyName => "EMPTY_NAME",
            Self::EmptySku => "EMPTY_SKU",
            Self::NegativePrice(_) => "NEGATIVE_PRICE",
            Self::NegativeOpeningStock(_) => "NEGATIVE_OPENING_STOCK",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::EmptyName
            | Self::EmptySku
            | Self::NegativePrice(_)
            | Self::NegativeOpeningStock(_) => 400,
            Self::CounterpartyNotFound(_) | Self::ProductNotFound(_) => 404,
            Self::ConcurrentModification => 409,
            Self::StoreUnavailable(_) => 503,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<StoreError> for DirectoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => Self::ConcurrentModification,
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        let message = err.to_string();
        match err {
            DirectoryError::CounterpartyNotFound(_) | DirectoryError::ProductNotFound(_) => {
                Self::NotFound(message)
            }
            DirectoryError::EmptyName
            | DirectoryError::EmptySku
            | DirectoryError::NegativePrice(_)
            | DirectoryError::NegativeOpeningStock(_) => Self::Validation(message),
            DirectoryError::ConcurrentModification => Self::Transient(message),
            DirectoryError::StoreUnavailable(_) => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use khata_shared::ErrorClass;

    #[test]
    fn test_store_conflict_maps_to_concurrent_modification() {
        let err = DirectoryError::from(StoreError::Conflict {
            key: "counterparties/x".into(),
        });
        assert!(err.is_retryable());
        assert_eq!(AppError::from(err).class(), ErrorClass::TryAgain);
    }

    #[test]
    fn test_validation_is_fix_input() {
        assert_eq!(DirectoryError::EmptyName.http_status_code(), 400);
        assert_eq!(
            AppError::from(DirectoryError::NegativePrice(Decimal::NEGATIVE_ONE)).class(),
            ErrorClass::FixInput
        );
    }
}
