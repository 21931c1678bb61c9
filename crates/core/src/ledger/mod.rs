//! Sales and purchase ledger.
//!
//! - Entry, line and input types
//! - Totals, tax and payment-split arithmetic
//! - Input validation
//! - The transaction engine that commits, edits, settles and deletes entries

pub mod error;
pub mod service;
pub mod totals;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod validation_props;

pub use error::{LedgerError, ValidationError};
pub use service::{
    DeleteOutcome, LedgerEngine, LedgerSettings, PaymentSettlement, UNKNOWN_SELLER,
    WALK_IN_CUSTOMER,
};
pub use totals::{EntryTotals, PaymentSplit, compute_totals, line_total, split_payment};
pub use types::{
    CounterpartySelection, EntityType, EntryPurpose, EntryType, LedgerEntry, LedgerEntryInput,
    LineItem, LineItemInput, PaymentApplicationInput, PaymentMethod, PaymentStatus,
};
pub use validation::{validate_entry_input, validate_payment_input};
