//! Storage port for every persisted record.
//!
//! The engine never talks to a database directly. It reads versioned records,
//! stages writes in a [`Transaction`], and hands the result to
//! [`LedgerStore::apply`], which commits every write or none of them.
//!
//! # Modules
//!
//! - `error` - Store error types
//! - `txn` - Transactions, the `Document` mapping and the `atomic` retry loop
//! - `memory` - In-memory store with secondary indexes

pub mod error;
pub mod memory;
pub mod txn;

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use khata_shared::types::{
    AuditLogId, CompanyId, CounterpartyId, LedgerEntryId, PaymentRecordId, ProductId,
    UpdateRequestId,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::AuditLog;
use crate::catalog::Product;
use crate::directory::{Counterparty, CounterpartyKind};
use crate::ledger::{EntryType, LedgerEntry, PaymentStatus};
use crate::payments::PaymentRecord;
use crate::workflow::{PendingRequestIndex, RequestStatus, UpdateRequest};

pub use error::StoreError;
pub use memory::MemoryStore;
pub use txn::{Document, Transaction, atomic};

/// A separately addressable collection of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Catalog products with their stock.
    Products,
    /// Customers and sellers.
    Counterparties,
    /// Ledger entries.
    LedgerEntries,
    /// Payment records.
    PaymentRecords,
    /// Approval-workflow requests.
    UpdateRequests,
    /// Audit trail.
    AuditLogs,
    /// Pending request id keyed by ledger entry id.
    PendingRequests,
}

impl Collection {
    /// Every collection, in a stable order.
    pub const ALL: [Self; 7] = [
        Self::Products,
        Self::Counterparties,
        Self::LedgerEntries,
        Self::PaymentRecords,
        Self::UpdateRequests,
        Self::AuditLogs,
        Self::PendingRequests,
    ];

    /// Returns the persisted name of the collection.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Counterparties => "counterparties",
            Self::LedgerEntries => "ledger_entries",
            Self::PaymentRecords => "payment_records",
            Self::UpdateRequests => "update_requests",
            Self::AuditLogs => "audit_logs",
            Self::PendingRequests => "pending_requests",
        }
    }

    /// Parses a collection from its persisted name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Address of one record: collection plus generated id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    /// Owning collection.
    pub collection: Collection,
    /// Record id within the collection.
    pub id: Uuid,
}

impl RecordKey {
    /// Creates a record key.
    #[must_use]
    pub const fn new(collection: Collection, id: Uuid) -> Self {
        Self { collection, id }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Any persisted record.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A catalog product.
    Product(Product),
    /// A customer or seller.
    Counterparty(Counterparty),
    /// A ledger entry.
    LedgerEntry(LedgerEntry),
    /// A payment record.
    PaymentRecord(PaymentRecord),
    /// An approval-workflow request.
    UpdateRequest(UpdateRequest),
    /// An audit log record.
    AuditLog(AuditLog),
    /// Pending request lookup for one ledger entry.
    PendingRequest(PendingRequestIndex),
}

impl Record {
    /// Returns the key this record is stored under.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        match self {
            Self::Product(r) => r.key(),
            Self::Counterparty(r) => r.key(),
            Self::LedgerEntry(r) => r.key(),
            Self::PaymentRecord(r) => r.key(),
            Self::UpdateRequest(r) => r.key(),
            Self::AuditLog(r) => r.key(),
            Self::PendingRequest(r) => r.key(),
        }
    }

    /// Returns the company the record is scoped to.
    #[must_use]
    pub fn company_id(&self) -> CompanyId {
        match self {
            Self::Product(r) => r.company_id,
            Self::Counterparty(r) => r.company_id,
            Self::LedgerEntry(r) => r.company_id,
            Self::PaymentRecord(r) => r.company_id,
            Self::UpdateRequest(r) => r.company_id,
            Self::AuditLog(r) => r.company_id,
            Self::PendingRequest(r) => r.company_id,
        }
    }

    /// Serializes the record body (without its collection tag).
    pub fn to_body(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Product(r) => serde_json::to_value(r),
            Self::Counterparty(r) => serde_json::to_value(r),
            Self::LedgerEntry(r) => serde_json::to_value(r),
            Self::PaymentRecord(r) => serde_json::to_value(r),
            Self::UpdateRequest(r) => serde_json::to_value(r),
            Self::AuditLog(r) => serde_json::to_value(r),
            Self::PendingRequest(r) => serde_json::to_value(r),
        }
    }

    /// Decodes a record body stored in `collection`.
    pub fn from_body(
        collection: Collection,
        body: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match collection {
            Collection::Products => Self::Product(serde_json::from_value(body)?),
            Collection::Counterparties => Self::Counterparty(serde_json::from_value(body)?),
            Collection::LedgerEntries => Self::LedgerEntry(serde_json::from_value(body)?),
            Collection::PaymentRecords => Self::PaymentRecord(serde_json::from_value(body)?),
            Collection::UpdateRequests => Self::UpdateRequest(serde_json::from_value(body)?),
            Collection::AuditLogs => Self::AuditLog(serde_json::from_value(body)?),
            Collection::PendingRequests => Self::PendingRequest(serde_json::from_value(body)?),
        })
    }
}

/// Maps a record type onto its collection and [`Record`] variant.
macro_rules! document {
    ($ty:ty, $id:ty, $field:ident, $collection:ident, $variant:ident) => {
        impl Document for $ty {
            type Id = $id;

            fn key_of(id: $id) -> RecordKey {
                RecordKey::new(Collection::$collection, id.into_inner())
            }

            fn key(&self) -> RecordKey {
                Self::key_of(self.$field)
            }

            fn into_record(self) -> Record {
                Record::$variant(self)
            }

            fn from_record(record: Record) -> Option<Self> {
                match record {
                    Record::$variant(doc) => Some(doc),
                    _ => None,
                }
            }
        }
    };
}

document!(Product, ProductId, id, Products, Product);
document!(Counterparty, CounterpartyId, id, Counterparties, Counterparty);
document!(LedgerEntry, LedgerEntryId, id, LedgerEntries, LedgerEntry);
document!(PaymentRecord, PaymentRecordId, id, PaymentRecords, PaymentRecord);
document!(UpdateRequest, UpdateRequestId, id, UpdateRequests, UpdateRequest);
document!(AuditLog, AuditLogId, id, AuditLogs, AuditLog);
document!(
    PendingRequestIndex,
    LedgerEntryId,
    entry_id,
    PendingRequests,
    PendingRequest
);

/// A record together with the store version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    /// Store-assigned version. Absent records are version 0.
    pub version: u64,
    /// The record.
    pub value: T,
}

/// One write in a [`CommitBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Insert or replace the record under its own key.
    Put(Record),
    /// Remove the record, if present.
    Delete(RecordKey),
}

impl Write {
    /// Returns the key the write targets.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        match self {
            Self::Put(record) => record.key(),
            Self::Delete(key) => *key,
        }
    }
}

/// An all-or-nothing group of writes guarded by read versions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitBatch {
    /// Every key read by the transaction with the version observed (0 = absent).
    pub expected: Vec<(RecordKey, u64)>,
    /// Writes applied only if every expectation still holds.
    pub writes: Vec<Write>,
}

impl CommitBatch {
    /// Returns true if the batch writes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// A composite index a store may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexSpec {
    /// Indexed collection.
    pub collection: Collection,
    /// Indexed fields, in order.
    pub fields: &'static [&'static str],
}

impl IndexSpec {
    /// Ledger entries by `(date, type)`.
    pub const ENTRIES_BY_DATE_AND_TYPE: Self = Self {
        collection: Collection::LedgerEntries,
        fields: &["date", "type"],
    };

    /// Ledger entries by `(entityId, type, paymentStatus)`.
    pub const ENTRIES_OUTSTANDING: Self = Self {
        collection: Collection::LedgerEntries,
        fields: &["entityId", "type", "paymentStatus"],
    };

    /// Every composite index the engine's access paths use.
    pub const ALL: [Self; 2] = [Self::ENTRIES_BY_DATE_AND_TYPE, Self::ENTRIES_OUTSTANDING];

    /// Builds the error reported when this index is missing.
    #[must_use]
    pub fn missing(&self) -> StoreError {
        StoreError::IndexRequired {
            collection: self.collection.as_str().to_string(),
            fields: self.fields.join(", "),
        }
    }
}

/// Indexed access paths over ledger entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryQuery {
    /// Every entry on a business date.
    ByDate(NaiveDate),
    /// Entries on a business date of one type.
    ByDateAndType(NaiveDate, EntryType),
    /// Pending or partial entries of one type for one counterparty.
    Outstanding {
        /// The counterparty.
        entity_id: CounterpartyId,
        /// Sale (receivable) or purchase (payable).
        entry_type: EntryType,
    },
}

impl EntryQuery {
    /// Returns the composite index this query needs, if any.
    #[must_use]
    pub fn required_index(&self) -> Option<IndexSpec> {
        match self {
            Self::ByDate(_) => None,
            Self::ByDateAndType(..) => Some(IndexSpec::ENTRIES_BY_DATE_AND_TYPE),
            Self::Outstanding { .. } => Some(IndexSpec::ENTRIES_OUTSTANDING),
        }
    }

    /// Returns true if `entry` belongs in the result set.
    #[must_use]
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        match *self {
            Self::ByDate(date) => entry.date == date,
            Self::ByDateAndType(date, entry_type) => {
                entry.date == date && entry.entry_type == entry_type
            }
            Self::Outstanding {
                entity_id,
                entry_type,
            } => {
                entry.entity_id == Some(entity_id)
                    && entry.entry_type == entry_type
                    && matches!(
                        entry.payment_status,
                        PaymentStatus::Pending | PaymentStatus::Partial
                    )
            }
        }
    }
}

/// Persistence port for the ledger.
///
/// Reads outside a [`Transaction`] are plain snapshots; only
/// [`apply`](LedgerStore::apply) enforces isolation.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Reads one record with its version.
    async fn read(&self, key: &RecordKey) -> Result<Option<Versioned<Record>>, StoreError>;

    /// Applies every write in `batch` if every expected version still matches,
    /// otherwise applies nothing and returns [`StoreError::Conflict`].
    async fn apply(&self, batch: CommitBatch) -> Result<(), StoreError>;

    /// Runs an indexed ledger entry query.
    async fn query_entries(
        &self,
        company_id: CompanyId,
        query: &EntryQuery,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Lists customers and/or sellers.
    async fn list_counterparties(
        &self,
        company_id: CompanyId,
        kind: Option<CounterpartyKind>,
    ) -> Result<Vec<Counterparty>, StoreError>;

    /// Lists catalog products.
    async fn list_products(&self, company_id: CompanyId) -> Result<Vec<Product>, StoreError>;

    /// Lists payment records for one counterparty.
    async fn payment_records_for(
        &self,
        company_id: CompanyId,
        entity_id: CounterpartyId,
    ) -> Result<Vec<PaymentRecord>, StoreError>;

    /// Lists approval requests, optionally filtered by status.
    async fn update_requests(
        &self,
        company_id: CompanyId,
        status: Option<RequestStatus>,
    ) -> Result<Vec<UpdateRequest>, StoreError>;

    /// Lists audit records that mention a ledger entry.
    async fn audit_logs_for(
        &self,
        company_id: CompanyId,
        entry_id: LedgerEntryId,
    ) -> Result<Vec<AuditLog>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names_round_trip() {
        for collection in Collection::ALL {
            assert_eq!(Collection::parse(collection.as_str()), Some(collection));
        }
        assert_eq!(Collection::parse("accounts"), None);
    }

    #[test]
    fn test_required_indexes() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(EntryQuery::ByDate(date).required_index(), None);
        assert_eq!(
            EntryQuery::ByDateAndType(date, EntryType::Sale).required_index(),
            Some(IndexSpec::ENTRIES_BY_DATE_AND_TYPE)
        );
        assert_eq!(
            EntryQuery::Outstanding {
                entity_id: CounterpartyId::new(),
                entry_type: EntryType::Purchase,
            }
            .required_index(),
            Some(IndexSpec::ENTRIES_OUTSTANDING)
        );
    }

    #[test]
    fn test_missing_index_error() {
        assert_eq!(
            IndexSpec::ENTRIES_OUTSTANDING.missing(),
            StoreError::IndexRequired {
                collection: "ledger_entries".into(),
                fields: "entityId, type, paymentStatus".into(),
            }
        );
    }

    #[test]
    fn test_record_key_display() {
        let id = Uuid::nil();
        assert_eq!(
            RecordKey::new(Collection::Products, id).to_string(),
            format!("products/{id}")
        );
    }
}
