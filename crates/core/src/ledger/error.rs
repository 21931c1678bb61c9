//! Ledger error types.
//!
//! `ValidationError` covers malformed input the caller can fix. `LedgerError`
//! wraps it together with referential, business-rule, concurrency, and
//! infrastructure failures. Nothing is ever written when either is returned.

use khata_shared::AppError;
use khata_shared::types::{CounterpartyId, LedgerEntryId, ProductId, UpdateRequestId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::directory::CounterpartyKind;
use crate::store::StoreError;

/// Input faults, recoverable by correcting the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A goods entry needs at least one line.
    #[error("Entry must have at least one item")]
    EmptyItems,

    /// A line has zero quantity.
    #[error("Quantity must be positive for product {0}")]
    NonPositiveQuantity(ProductId),

    /// A line has a negative unit price.
    #[error("Unit price cannot be negative for product {0}")]
    NegativeUnitPrice(ProductId),

    /// Paid and partial entries need a payment method.
    #[error("Payment method is required when payment status is paid or partial")]
    PaymentMethodRequired,

    /// Partial payment must be strictly between zero and the total.
    #[error("Partial payment {amount_paid} must be greater than 0 and less than {grand_total}")]
    PartialAmountOutOfRange {
        /// Amount offered.
        amount_paid: Decimal,
        /// Entry total.
        grand_total: Decimal,
    },

    /// The counterparty kind does not fit the entry type.
    #[error("Entry needs a {expected}, but the selected counterparty is a {actual}")]
    EntityKindMismatch {
        /// Kind the entry type trades with.
        expected: CounterpartyKind,
        /// Kind of the selected counterparty.
        actual: CounterpartyKind,
    },

    /// A new counterparty needs a name.
    #[error("Counterparty name cannot be empty")]
    EmptyCounterpartyName,

    /// Payment amount must be positive.
    #[error("Payment amount must be positive")]
    NonPositivePayment,

    /// A payment must select at least one entry.
    #[error("Select at least one entry to settle")]
    NoEntriesSelected,

    /// The same entry was selected twice.
    #[error("Entry {0} was selected more than once")]
    DuplicateSelection(LedgerEntryId),

    /// The selected entry has nothing left to pay.
    #[error("Entry {0} has no outstanding balance")]
    EntryNotOutstanding(LedgerEntryId),

    /// The selected entry belongs to another counterparty or type.
    #[error("Entry {0} does not belong to the selected counterparty")]
    EntryEntityMismatch(LedgerEntryId),

    /// The payment exceeds what the selected entries owe.
    #[error("Payment {requested} exceeds the outstanding balance {outstanding} of the selected entries")]
    Overpayment {
        /// Amount offered.
        requested: Decimal,
        /// Sum of the selected entries' remaining balances.
        outstanding: Decimal,
    },

    /// Payment applications are not edited, only deleted.
    #[error("Entry {0} records a payment and cannot be edited; delete it instead")]
    PaymentEntryNotEditable(LedgerEntryId),

    /// Later payment applications have settled part of the entry.
    #[error("Entry {0} has settlements applied; delete those payments before editing it")]
    SettledEntryNotEditable(LedgerEntryId),
}

/// Errors raised by the ledger engine.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or incomplete input.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A line references a missing product.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The selected counterparty does not exist.
    #[error("Counterparty not found: {0}")]
    EntityNotFound(CounterpartyId),

    /// The ledger entry does not exist.
    #[error("Ledger entry not found: {0}")]
    EntryNotFound(LedgerEntryId),

    /// The approval request does not exist.
    #[error("Update request not found: {0}")]
    RequestNotFound(UpdateRequestId),

    /// Stock would go negative.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        /// Product short of stock.
        product_id: ProductId,
        /// Units on hand.
        available: i64,
        /// Units the commit needed to remove.
        requested: i64,
    },

    /// Data changed under every retry.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    /// A change request is already waiting for this entry.
    #[error("Entry {entry_id} already has a pending change request {request_id}")]
    RequestAlreadyPending {
        /// Entry with a pending request.
        entry_id: LedgerEntryId,
        /// The pending request.
        request_id: UpdateRequestId,
    },

    /// The actor may not perform this mutation directly.
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

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::EntityNotFound(_) => "ENTITY_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::RequestAlreadyPending { .. } => "REQUEST_ALREADY_PENDING",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::IndexRequired { .. } => "INDEX_REQUIRED",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::Validation(_) => 400,

            // 403 Forbidden - permission errors
            Self::PermissionDenied(_) => 403,

            // 404 Not Found
            Self::ProductNotFound(_)
            | Self::EntityNotFound(_)
            | Self::EntryNotFound(_)
            | Self::RequestNotFound(_) => 404,

            // 409 Conflict
            Self::ConcurrentModification | Self::RequestAlreadyPending { .. } => 409,

            // 422 Unprocessable - business rules
            Self::InsufficientStock { .. } => 422,

            // 500/503 - infrastructure
            Self::IndexRequired { .. } => 500,
            Self::StoreUnavailable(_) => 503,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => Self::ConcurrentModification,
            StoreError::IndexRequired { collection, fields } => {
                Self::IndexRequired { collection, fields }
            }
            StoreError::Unavailable(message) => Self::StoreUnavailable(message),
            corrupt @ StoreError::Corrupt { .. } => Self::StoreUnavailable(corrupt.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::Validation(_) => Self::Validation(message),
            LedgerError::ProductNotFound(_)
            | LedgerError::EntityNotFound(_)
            | LedgerError::EntryNotFound(_)
            | LedgerError::RequestNotFound(_) => Self::NotFound(message),
            LedgerError::InsufficientStock { .. } => Self::BusinessRule(message),
            LedgerError::ConcurrentModification => Self::Transient(message),
            LedgerError::RequestAlreadyPending { .. } => Self::Conflict(message),
            LedgerError::PermissionDenied(_) => Self::Forbidden(message),
            LedgerError::IndexRequired { .. } => Self::Misconfigured(message),
            LedgerError::StoreUnavailable(_) => Self::Database(message),
        }
    }
}
