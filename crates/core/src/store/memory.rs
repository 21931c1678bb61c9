//! In-memory [`LedgerStore`] with maintained secondary indexes.
//!
//! Used by tests and by embedders that do not need durability. One lock
//! guards every record, so `apply` is trivially serializable.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::RangeInclusive;

use async_trait::async_trait;
use chrono::NaiveDate;
use khata_shared::types::{CompanyId, CounterpartyId, LedgerEntryId};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CommitBatch, Document, EntryQuery, IndexSpec, LedgerStore, Record, RecordKey, StoreError,
    Versioned, Write,
};
use crate::audit::AuditLog;
use crate::catalog::Product;
use crate::directory::{Counterparty, CounterpartyKind};
use crate::ledger::{EntryType, LedgerEntry, PaymentStatus};
use crate::payments::PaymentRecord;
use crate::store::Collection;
use crate::workflow::{RequestStatus, UpdateRequest};

type OutstandingKey = (CompanyId, CounterpartyId, EntryType);

#[derive(Default)]
struct Inner {
    records: BTreeMap<RecordKey, Versioned<Record>>,
    last_version: u64,
    entries_by_date: BTreeMap<(CompanyId, NaiveDate), BTreeSet<LedgerEntryId>>,
    outstanding: HashMap<OutstandingKey, BTreeSet<LedgerEntryId>>,
}

impl Inner {
    fn index(&mut self, entry: &LedgerEntry) {
        self.entries_by_date
            .entry((entry.company_id, entry.date))
            .or_default()
            .insert(entry.id);
        if let Some(key) = outstanding_key(entry) {
            self.outstanding.entry(key).or_default().insert(entry.id);
        }
    }

    fn unindex(&mut self, entry: &LedgerEntry) {
        if let Some(ids) = self.entries_by_date.get_mut(&(entry.company_id, entry.date)) {
            ids.remove(&entry.id);
            if ids.is_empty() {
                self.entries_by_date.remove(&(entry.company_id, entry.date));
            }
        }
        if let Some(key) = outstanding_key(entry)
            && let Some(ids) = self.outstanding.get_mut(&key)
        {
            ids.remove(&entry.id);
            if ids.is_empty() {
                self.outstanding.remove(&key);
            }
        }
    }

    fn remove(&mut self, key: &RecordKey) {
        if let Some(old) = self.records.remove(key)
            && let Record::LedgerEntry(entry) = &old.value
        {
            self.unindex(entry);
        }
    }

    fn insert(&mut self, record: Record, version: u64) {
        let key = record.key();
        self.remove(&key);
        if let Record::LedgerEntry(entry) = &record {
            self.index(entry);
        }
        self.records.insert(
            key,
            Versioned {
                version,
                value: record,
            },
        );
    }

    fn entry(&self, id: LedgerEntryId) -> Option<&LedgerEntry> {
        match self.records.get(&LedgerEntry::key_of(id)).map(|v| &v.value) {
            Some(Record::LedgerEntry(entry)) => Some(entry),
            _ => None,
        }
    }

    fn collection(&self, collection: Collection) -> impl Iterator<Item = &Record> {
        self.records
            .range(collection_range(collection))
            .map(|(_, v)| &v.value)
    }
}

fn outstanding_key(entry: &LedgerEntry) -> Option<OutstandingKey> {
    match (entry.entity_id, entry.payment_status) {
        (Some(entity_id), PaymentStatus::Pending | PaymentStatus::Partial) => {
            Some((entry.company_id, entity_id, entry.entry_type))
        }
        _ => None,
    }
}

fn collection_range(collection: Collection) -> RangeInclusive<RecordKey> {
    RecordKey::new(collection, Uuid::nil())..=RecordKey::new(collection, Uuid::from_u128(u128::MAX))
}

/// In-memory store.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    declared: Vec<IndexSpec>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store declaring every composite index.
    #[must_use]
    pub fn new() -> Self {
        Self::with_indexes(IndexSpec::ALL)
    }

    /// Creates an empty store declaring only `indexes`.
    ///
    /// Queries that need an undeclared composite index fail with
    /// [`StoreError::IndexRequired`], the way a hosted document store does.
    #[must_use]
    pub fn with_indexes(indexes: impl IntoIterator<Item = IndexSpec>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            declared: indexes.into_iter().collect(),
        }
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }

    fn require(&self, query: &EntryQuery) -> Result<(), StoreError> {
        match query.required_index() {
            Some(index) if !self.declared.contains(&index) => Err(index.missing()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn read(&self, key: &RecordKey) -> Result<Option<Versioned<Record>>, StoreError> {
        Ok(self.inner.read().await.records.get(key).cloned())
    }

    async fn apply(&self, batch: CommitBatch) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        for (key, expected) in &batch.expected {
            let actual = inner.records.get(key).map_or(0, |v| v.version);
            if actual != *expected {
                return Err(StoreError::Conflict {
                    key: key.to_string(),
                });
            }
        }

        for write in batch.writes {
            match write {
                Write::Put(record) => {
                    inner.last_version += 1;
                    let version = inner.last_version;
                    inner.insert(record, version);
                }
                Write::Delete(key) => inner.remove(&key),
            }
        }
        Ok(())
    }

    async fn query_entries(
        &self,
        company_id: CompanyId,
        query: &EntryQuery,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        self.require(query)?;
        let inner = self.inner.read().await;

        let ids: Vec<LedgerEntryId> = match *query {
            EntryQuery::ByDate(date) | EntryQuery::ByDateAndType(date, _) => inner
                .entries_by_date
                .get(&(company_id, date))
                .map(|ids| ids.iter().copied().collect())
                .unwrap_or_default(),
            EntryQuery::Outstanding {
                entity_id,
                entry_type,
            } => inner
                .outstanding
                .get(&(company_id, entity_id, entry_type))
                .map(|ids| ids.iter().copied().collect())
                .unwrap_or_default(),
        };

        Ok(ids
            .into_iter()
            .filter_map(|id| inner.entry(id))
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect())
    }

    async fn list_counterparties(
        &self,
        company_id: CompanyId,
        kind: Option<CounterpartyKind>,
    ) -> Result<Vec<Counterparty>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .collection(Collection::Counterparties)
            .filter_map(|r| match r {
                Record::Counterparty(c) if c.company_id == company_id => Some(c),
                _ => None,
            })
            .filter(|c| kind.is_none_or(|k| c.kind == k))
            .cloned()
            .collect())
    }

    async fn list_products(&self, company_id: CompanyId) -> Result<Vec<Product>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .collection(Collection::Products)
            .filter_map(|r| match r {
                Record::Product(p) if p.company_id == company_id => Some(p.clone()),
                _ => None,
            })
            .collect())
    }

    async fn payment_records_for(
        &self,
        company_id: CompanyId,
        entity_id: CounterpartyId,
    ) -> Result<Vec<PaymentRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .collection(Collection::PaymentRecords)
            .filter_map(|r| match r {
                Record::PaymentRecord(p)
                    if p.company_id == company_id && p.related_entity_id == Some(entity_id) =>
                {
                    Some(p.clone())
                }
                _ => None,
            })
            .collect())
    }

    async fn update_requests(
        &self,
        company_id: CompanyId,
        status: Option<RequestStatus>,
    ) -> Result<Vec<UpdateRequest>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .collection(Collection::UpdateRequests)
            .filter_map(|r| match r {
                Record::UpdateRequest(u) if u.company_id == company_id => Some(u),
                _ => None,
            })
            .filter(|u| status.is_none_or(|s| u.status == s))
            .cloned()
            .collect())
    }

    async fn audit_logs_for(
        &self,
        company_id: CompanyId,
        entry_id: LedgerEntryId,
    ) -> Result<Vec<AuditLog>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .collection(Collection::AuditLogs)
            .filter_map(|r| match r {
                Record::AuditLog(a) if a.company_id == company_id && a.ledger_entry_id == entry_id => {
                    Some(a.clone())
                }
                _ => None,
            })
            .collect())
    }
}
