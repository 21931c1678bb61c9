//! PostgreSQL implementation of the ledger store.
//!
//! Records are rows of the `documents` table. A commit runs in one database
//! transaction: every version the caller read is re-checked under
//! `SELECT ... FOR UPDATE`, then every write is applied. Inserting a key that
//! was read as absent uses a plain `INSERT`, so two commits racing to create
//! the same record collide on the primary key and one of them sees a conflict.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use khata_core::audit::AuditLog;
use khata_core::catalog::Product;
use khata_core::directory::{Counterparty, CounterpartyKind};
use khata_core::ledger::{LedgerEntry, PaymentStatus};
use khata_core::payments::PaymentRecord;
use khata_core::store::{
    Collection, CommitBatch, Document, EntryQuery, IndexSpec, LedgerStore, Record, RecordKey,
    StoreError, Versioned, Write,
};
use khata_core::workflow::{RequestStatus, UpdateRequest};
use khata_shared::types::{CompanyId, CounterpartyId, LedgerEntryId};
use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr,
    EntityTrait, QueryFilter, QuerySelect, SqlErr, Statement, TransactionTrait, Value,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entities::documents;

const INSERT_SQL: &str = r"
INSERT INTO documents (
    collection, id, company_id, version, body,
    entry_date, entry_type, entity_id, payment_status, request_status,
    ledger_entry_id, counterparty_kind, updated_at
)
VALUES ($1, $2, $3, nextval('document_version_seq'), $4, $5, $6, $7, $8, $9, $10, $11, now())
";

const UPSERT_SUFFIX: &str = r"
ON CONFLICT (collection, id) DO UPDATE SET
    company_id = EXCLUDED.company_id,
    version = EXCLUDED.version,
    body = EXCLUDED.body,
    entry_date = EXCLUDED.entry_date,
    entry_type = EXCLUDED.entry_type,
    entity_id = EXCLUDED.entity_id,
    payment_status = EXCLUDED.payment_status,
    request_status = EXCLUDED.request_status,
    ledger_entry_id = EXCLUDED.ledger_entry_id,
    counterparty_kind = EXCLUDED.counterparty_kind,
    updated_at = EXCLUDED.updated_at
";

/// Indexed columns derived from a record body.
#[derive(Debug, Default, PartialEq)]
struct Projection {
    entry_date: Option<NaiveDate>,
    entry_type: Option<&'static str>,
    entity_id: Option<Uuid>,
    payment_status: Option<&'static str>,
    request_status: Option<&'static str>,
    ledger_entry_id: Option<Uuid>,
    counterparty_kind: Option<&'static str>,
}

impl Projection {
    fn of(record: &Record) -> Self {
        match record {
            Record::LedgerEntry(e) => Self {
                entry_date: Some(e.date),
                entry_type: Some(e.entry_type.as_str()),
                entity_id: e.entity_id.map(CounterpartyId::into_inner),
                payment_status: Some(e.payment_status.as_str()),
                ..Self::default()
            },
            Record::PaymentRecord(p) => Self {
                entity_id: p.related_entity_id.map(CounterpartyId::into_inner),
                ledger_entry_id: p.ledger_entry_id.map(LedgerEntryId::into_inner),
                ..Self::default()
            },
            Record::UpdateRequest(u) => Self {
                request_status: Some(u.status.as_str()),
                ledger_entry_id: Some(u.original_ledger_entry_id.into_inner()),
                ..Self::default()
            },
            Record::AuditLog(a) => Self {
                ledger_entry_id: Some(a.ledger_entry_id.into_inner()),
                ..Self::default()
            },
            Record::PendingRequest(p) => Self {
                ledger_entry_id: Some(p.entry_id.into_inner()),
                ..Self::default()
            },
            Record::Counterparty(c) => Self {
                counterparty_kind: Some(c.kind.as_str()),
                ..Self::default()
            },
            Record::Product(_) => Self::default(),
        }
    }
}

fn unavailable(e: &DbErr) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn corrupt(key: impl ToString, reason: impl ToString) -> StoreError {
    StoreError::Corrupt {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn decode(model: documents::Model) -> Result<Versioned<Record>, StoreError> {
    let key = format!("{}/{}", model.collection, model.id);
    let collection = Collection::parse(&model.collection)
        .ok_or_else(|| corrupt(&key, "unknown collection"))?;
    let version = u64::try_from(model.version).map_err(|e| corrupt(&key, e))?;
    let value = Record::from_body(collection, model.body).map_err(|e| corrupt(&key, e))?;
    Ok(Versioned { version, value })
}

fn decode_all<D: Document>(models: Vec<documents::Model>) -> Result<Vec<D>, StoreError> {
    models
        .into_iter()
        .map(|model| {
            let key = format!("{}/{}", model.collection, model.id);
            D::from_record(decode(model)?.value)
                .ok_or_else(|| corrupt(key, "record of another collection"))
        })
        .collect()
}

fn in_collection(collection: Collection, company_id: CompanyId) -> SimpleExpr {
    documents::Column::Collection
        .eq(collection.as_str())
        .and(documents::Column::CompanyId.eq(company_id.into_inner()))
}

/// [`LedgerStore`] over a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: DatabaseConnection,
    declared: HashSet<IndexSpec>,
}

impl PgStore {
    /// Creates a store declaring the indexes the initial migration creates.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_indexes(db, IndexSpec::ALL)
    }

    /// Creates a store declaring only `indexes`.
    #[must_use]
    pub fn with_indexes(
        db: DatabaseConnection,
        indexes: impl IntoIterator<Item = IndexSpec>,
    ) -> Self {
        Self {
            db,
            declared: indexes.into_iter().collect(),
        }
    }

    /// Returns the underlying connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn require(&self, query: &EntryQuery) -> Result<(), StoreError> {
        match query.required_index() {
            Some(index) if !self.declared.contains(&index) => Err(index.missing()),
            _ => Ok(()),
        }
    }

    async fn find_all(
        &self,
        collection: Collection,
        company_id: CompanyId,
        filter: Option<SimpleExpr>,
    ) -> Result<Vec<documents::Model>, StoreError> {
        let mut condition = in_collection(collection, company_id);
        if let Some(filter) = filter {
            condition = condition.and(filter);
        }
        documents::Entity::find()
            .filter(condition)
            .all(&self.db)
            .await
            .map_err(|e| unavailable(&e))
    }
}

async fn locked_version(txn: &DatabaseTransaction, key: &RecordKey) -> Result<u64, StoreError> {
    let row = documents::Entity::find_by_id((key.collection.as_str().to_string(), key.id))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(|e| unavailable(&e))?;
    match row {
        Some(row) => u64::try_from(row.version).map_err(|e| corrupt(key, e)),
        None => Ok(0),
    }
}

async fn write_record(
    txn: &DatabaseTransaction,
    record: &Record,
    upsert: bool,
) -> Result<(), StoreError> {
    let key = record.key();
    let body = record.to_body().map_err(|e| corrupt(key, e))?;
    let p = Projection::of(record);
    let values: Vec<Value> = vec![
        key.collection.as_str().into(),
        key.id.into(),
        record.company_id().into_inner().into(),
        body.into(),
        p.entry_date.into(),
        p.entry_type.map(str::to_string).into(),
        p.entity_id.into(),
        p.payment_status.map(str::to_string).into(),
        p.request_status.map(str::to_string).into(),
        p.ledger_entry_id.into(),
        p.counterparty_kind.map(str::to_string).into(),
    ];
    let sql = if upsert {
        format!("{INSERT_SQL}{UPSERT_SUFFIX}")
    } else {
        INSERT_SQL.to_string()
    };

    match txn
        .execute(Statement::from_sql_and_values(DbBackend::Postgres, sql, values))
        .await
    {
        Ok(_) => Ok(()),
        Err(e) => match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Err(StoreError::Conflict {
                key: key.to_string(),
            }),
            _ => Err(unavailable(&e)),
        },
    }
}

async fn apply_in(txn: &DatabaseTransaction, batch: &CommitBatch) -> Result<(), StoreError> {
    let mut expected: HashMap<RecordKey, u64> = HashMap::with_capacity(batch.expected.len());
    for (key, version) in &batch.expected {
        let actual = locked_version(txn, key).await?;
        if actual != *version {
            return Err(StoreError::Conflict {
                key: key.to_string(),
            });
        }
        expected.insert(*key, *version);
    }

    for write in &batch.writes {
        match write {
            Write::Put(record) => {
                let read_as_absent = expected.get(&record.key()) == Some(&0);
                write_record(txn, record, !read_as_absent).await?;
            }
            Write::Delete(key) => {
                documents::Entity::delete_by_id((key.collection.as_str().to_string(), key.id))
                    .exec(txn)
                    .await
                    .map_err(|e| unavailable(&e))?;
            }
        }
    }
    Ok(())
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn read(&self, key: &RecordKey) -> Result<Option<Versioned<Record>>, StoreError> {
        documents::Entity::find_by_id((key.collection.as_str().to_string(), key.id))
            .one(&self.db)
            .await
            .map_err(|e| unavailable(&e))?
            .map(decode)
            .transpose()
    }

    async fn apply(&self, batch: CommitBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let txn = self.db.begin().await.map_err(|e| unavailable(&e))?;
        match apply_in(&txn, &batch).await {
            Ok(()) => {
                txn.commit().await.map_err(|e| unavailable(&e))?;
                debug!(writes = batch.writes.len(), "batch committed");
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn query_entries(
        &self,
        company_id: CompanyId,
        query: &EntryQuery,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        self.require(query)?;
        let filter = match *query {
            EntryQuery::ByDate(date) => documents::Column::EntryDate.eq(date),
            EntryQuery::ByDateAndType(date, entry_type) => documents::Column::EntryDate
                .eq(date)
                .and(documents::Column::EntryType.eq(entry_type.as_str())),
            EntryQuery::Outstanding {
                entity_id,
                entry_type,
            } => documents::Column::EntityId
                .eq(entity_id.into_inner())
                .and(documents::Column::EntryType.eq(entry_type.as_str()))
                .and(documents::Column::PaymentStatus.is_in([
                    PaymentStatus::Pending.as_str(),
                    PaymentStatus::Partial.as_str(),
                ])),
        };
        let models = self
            .find_all(Collection::LedgerEntries, company_id, Some(filter))
            .await?;
        decode_all(models)
    }

    async fn list_counterparties(
        &self,
        company_id: CompanyId,
        kind: Option<CounterpartyKind>,
    ) -> Result<Vec<Counterparty>, StoreError> {
        let filter = kind.map(|k| documents::Column::CounterpartyKind.eq(k.as_str()));
        let models = self
            .find_all(Collection::Counterparties, company_id, filter)
            .await?;
        decode_all(models)
    }

    async fn list_products(&self, company_id: CompanyId) -> Result<Vec<Product>, StoreError> {
        let models = self.find_all(Collection::Products, company_id, None).await?;
        decode_all(models)
    }

    async fn payment_records_for(
        &self,
        company_id: CompanyId,
        entity_id: CounterpartyId,
    ) -> Result<Vec<PaymentRecord>, StoreError> {
        let filter = documents::Column::EntityId.eq(entity_id.into_inner());
        let models = self
            .find_all(Collection::PaymentRecords, company_id, Some(filter))
            .await?;
        decode_all(models)
    }

    async fn update_requests(
        &self,
        company_id: CompanyId,
        status: Option<RequestStatus>,
    ) -> Result<Vec<UpdateRequest>, StoreError> {
        let filter = status.map(|s| documents::Column::RequestStatus.eq(s.as_str()));
        let models = self
            .find_all(Collection::UpdateRequests, company_id, filter)
            .await?;
        decode_all(models)
    }

    async fn audit_logs_for(
        &self,
        company_id: CompanyId,
        entry_id: LedgerEntryId,
    ) -> Result<Vec<AuditLog>, StoreError> {
        let filter = documents::Column::LedgerEntryId.eq(entry_id.into_inner());
        let models = self
            .find_all(Collection::AuditLogs, company_id, Some(filter))
            .await?;
        decode_all(models)
    }
}
