//! Payment record types.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use khata_shared::types::{CompanyId, CounterpartyId, LedgerEntryId, PaymentRecordId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{EntryType, PaymentMethod};

/// Direction of the money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRecordType {
    /// Money received from a customer.
    Customer,
    /// Money paid to a supplier.
    Supplier,
}

impl PaymentRecordType {
    /// Returns the record type for payments on entries of `entry_type`.
    #[must_use]
    pub fn for_entry_type(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Sale => Self::Customer,
            EntryType::Purchase => Self::Supplier,
        }
    }
}

/// Status of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentRecordStatus {
    /// The linked invoice is fully paid.
    Completed,
    /// Nothing has been paid yet.
    Pending,
    /// The linked invoice is partly paid.
    Partial,
    /// Standalone payment made to a supplier.
    Sent,
    /// Standalone payment received from a customer.
    Received,
}

impl PaymentRecordStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Pending => "Pending",
            Self::Partial => "Partial",
            Self::Sent => "Sent",
            Self::Received => "Received",
        }
    }
}

impl fmt::Display for PaymentRecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Amount of a payment applied to one ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentApplication {
    /// Settled entry.
    pub ledger_entry_id: LedgerEntryId,
    /// Amount applied to it.
    pub amount: Decimal,
}

/// A record of money movement, kept for counterparty payment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Record id.
    pub id: PaymentRecordId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Customer receipt or supplier payment.
    #[serde(rename = "type")]
    pub record_type: PaymentRecordType,
    /// Counterparty, absent for anonymous walk-ins.
    pub related_entity_id: Option<CounterpartyId>,
    /// Counterparty name at the time of payment.
    pub related_entity_name: String,
    /// Money moved.
    pub amount_paid: Decimal,
    /// How it was paid.
    pub method: PaymentMethod,
    /// Record status.
    pub status: PaymentRecordStatus,
    /// Ledger entry this record belongs to.
    pub ledger_entry_id: Option<LedgerEntryId>,
    /// Per-entry amounts of a standalone settlement.
    #[serde(default)]
    pub applications: Vec<PaymentApplication>,
    /// Invoice total (or total outstanding for a settlement).
    pub original_invoice_amount: Decimal,
    /// Balance left on the invoice after this payment.
    pub remaining_balance_on_invoice: Decimal,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Who recorded the payment.
    pub created_by_uid: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Returns the ids of every entry this payment paid down.
    #[must_use]
    pub fn settled_ledger_entry_ids(&self) -> BTreeSet<LedgerEntryId> {
        self.applications
            .iter()
            .map(|a| a.ledger_entry_id)
            .collect()
    }

    /// Returns the sum applied to settled entries.
    #[must_use]
    pub fn total_applied(&self) -> Decimal {
        self.applications.iter().map(|a| a.amount).sum()
    }
}
