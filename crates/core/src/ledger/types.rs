//! Ledger domain types.
//!
//! `LedgerEntry` is the persisted shape of one sale, purchase, or payment
//! application. The `*Input` types are what callers submit; the engine derives
//! every monetary field from them.

use chrono::{DateTime, NaiveDate, Utc};
use khata_shared::types::{
    CompanyId, CounterpartyId, LedgerEntryId, PaymentRecordId, ProductId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::directory::CounterpartyKind;

/// Sale or purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Goods leave, money is owed to us.
    Sale,
    /// Goods arrive, money is owed by us.
    Purchase,
}

impl EntryType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Purchase => "purchase",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sale" => Some(Self::Sale),
            "purchase" => Some(Self::Purchase),
            _ => None,
        }
    }

    /// Returns the counterparty kind this type trades with.
    #[must_use]
    pub fn counterparty_kind(&self) -> CounterpartyKind {
        match self {
            Self::Sale => CounterpartyKind::Customer,
            Self::Purchase => CounterpartyKind::Seller,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an entry moves goods or only settles money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryPurpose {
    /// Goods movement with line items.
    LedgerRecord,
    /// Payment applied against earlier pending or partial entries.
    PaymentRecord,
}

/// Kind of counterparty on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Directory customer.
    Customer,
    /// Directory seller.
    Seller,
    /// Anonymous walk-in customer.
    UnknownCustomer,
    /// Anonymous seller.
    UnknownSeller,
}

impl EntityType {
    /// Returns the string representation of the entity type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Seller => "seller",
            Self::UnknownCustomer => "unknown_customer",
            Self::UnknownSeller => "unknown_seller",
        }
    }

    /// Entity type for a directory counterparty of `kind`.
    #[must_use]
    pub fn known(kind: CounterpartyKind) -> Self {
        match kind {
            CounterpartyKind::Customer => Self::Customer,
            CounterpartyKind::Seller => Self::Seller,
        }
    }

    /// Entity type for an anonymous counterparty on an entry of `entry_type`.
    #[must_use]
    pub fn anonymous(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Sale => Self::UnknownCustomer,
            EntryType::Purchase => Self::UnknownSeller,
        }
    }

    /// Returns true for walk-in counterparties without a directory record.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::UnknownCustomer | Self::UnknownSeller)
    }
}

/// Payment state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Fully paid.
    Paid,
    /// Nothing paid.
    Pending,
    /// Partly paid.
    Partial,
}

impl PaymentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
            Self::Partial => "partial",
        }
    }

    /// Returns true if some money has changed hands.
    #[must_use]
    pub fn has_payment(&self) -> bool {
        matches!(self, Self::Paid | Self::Partial)
    }

    /// Derives the status from the amount paid against a total.
    #[must_use]
    pub fn from_amounts(amount_paid: Decimal, grand_total: Decimal) -> Self {
        if amount_paid <= Decimal::ZERO && grand_total > Decimal::ZERO {
            Self::Pending
        } else if amount_paid >= grand_total {
            Self::Paid
        } else {
            Self::Partial
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How money was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash.
    Cash,
    /// UPI transfer.
    Upi,
    /// Debit or credit card.
    Card,
    /// Bank transfer (NEFT/IMPS/RTGS).
    BankTransfer,
    /// Cheque.
    Cheque,
}

impl PaymentMethod {
    /// Returns the display label used by listings and search.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Upi => "UPI",
            Self::Card => "Card",
            Self::BankTransfer => "Bank Transfer",
            Self::Cheque => "Cheque",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One line of goods on an entry.
///
/// `product_name` and `unit_of_measure` are a snapshot taken when the line was
/// recorded and may drift from the live product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product moved.
    pub product_id: ProductId,
    /// Product name at recording time.
    pub product_name: String,
    /// Units moved, always positive.
    pub quantity: u32,
    /// Price per unit.
    pub unit_price: Decimal,
    /// `quantity * unit_price`, rounded.
    pub total_price: Decimal,
    /// Unit of measure at recording time.
    pub unit_of_measure: String,
}

/// One committed ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Entry id, immutable.
    pub id: LedgerEntryId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Business date.
    pub date: NaiveDate,
    /// Sale or purchase.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Goods movement or payment application.
    pub entry_purpose: EntryPurpose,
    /// Kind of counterparty.
    pub entity_type: EntityType,
    /// Directory counterparty, absent for anonymous ones.
    pub entity_id: Option<CounterpartyId>,
    /// Counterparty name at recording time.
    pub entity_name: String,
    /// Goods lines; empty only for payment applications.
    pub items: Vec<LineItem>,
    /// Whether GST was applied.
    pub gst_applied: bool,
    /// Sum of line totals.
    pub sub_total: Decimal,
    /// GST on the subtotal, zero when not applied.
    pub tax_amount: Decimal,
    /// `sub_total + tax_amount`.
    pub grand_total: Decimal,
    /// Payment state.
    pub payment_status: PaymentStatus,
    /// Required when paid or partial.
    pub payment_method: Option<PaymentMethod>,
    /// Money received or paid so far.
    pub amount_paid_now: Decimal,
    /// `grand_total - amount_paid_now`, never negative.
    pub remaining_amount: Decimal,
    /// Part of `amount_paid_now` that arrived through later settlements.
    #[serde(default)]
    pub settled_amount: Decimal,
    /// Payment record written alongside this entry.
    pub associated_payment_record_id: Option<PaymentRecordId>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Creator.
    pub created_by_uid: UserId,
    /// Creator display name.
    pub created_by_name: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last editor.
    pub updated_by_uid: Option<UserId>,
    /// Last editor display name.
    pub updated_by_name: Option<String>,
    /// Last change time.
    pub updated_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    /// Returns true if the balance fields agree with the total.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.amount_paid_now + self.remaining_amount == self.grand_total
            && self.remaining_amount >= Decimal::ZERO
    }

    /// Returns true if money is still owed on this entry.
    #[must_use]
    pub fn is_outstanding(&self) -> bool {
        self.remaining_amount > Decimal::ZERO
    }
}

/// How the caller picked the counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CounterpartySelection {
    /// A directory customer or seller.
    Existing {
        /// The counterparty.
        id: CounterpartyId,
    },
    /// A walk-in without a directory record.
    Anonymous {
        /// Optional display name; a default is used when absent.
        name: Option<String>,
    },
    /// A new directory counterparty created in the same commit.
    New {
        /// Display name.
        name: String,
        /// Contact phone.
        phone: Option<String>,
    },
}

/// One requested line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    /// Product moved.
    pub product_id: ProductId,
    /// Units moved.
    pub quantity: u32,
    /// Price per unit; the product's price when absent.
    pub unit_price: Option<Decimal>,
}

/// Proposed sale or purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntryInput {
    /// Business date.
    pub date: NaiveDate,
    /// Sale or purchase.
    pub entry_type: EntryType,
    /// Counterparty selection.
    pub counterparty: CounterpartySelection,
    /// Requested lines.
    pub items: Vec<LineItemInput>,
    /// Apply GST to the subtotal.
    pub apply_gst: bool,
    /// Requested payment state.
    pub payment_status: PaymentStatus,
    /// Required when paid or partial.
    pub payment_method: Option<PaymentMethod>,
    /// Down payment; only read when partial.
    pub amount_paid_now: Option<Decimal>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// A payment spread over pending or partial entries of one counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentApplicationInput {
    /// Counterparty paying or being paid.
    pub entity_id: CounterpartyId,
    /// Sale entries (money in) or purchase entries (money out).
    pub entry_type: EntryType,
    /// Amount of the payment.
    pub amount: Decimal,
    /// How it was paid.
    pub method: PaymentMethod,
    /// Business date of the payment.
    pub date: NaiveDate,
    /// Entries to settle, in the order to settle them.
    pub selected_entry_ids: Vec<LedgerEntryId>,
    /// Free-form notes.
    pub notes: Option<String>,
}
