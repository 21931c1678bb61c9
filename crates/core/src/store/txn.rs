//! Optimistic transactions and the `atomic` retry loop.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{CommitBatch, LedgerStore, Record, RecordKey, StoreError, Write};

/// A record type stored in exactly one collection.
pub trait Document: Sized {
    /// Typed id of the record.
    type Id: Copy;

    /// Returns the key a record with `id` is stored under.
    fn key_of(id: Self::Id) -> RecordKey;

    /// Returns this record's key.
    fn key(&self) -> RecordKey;

    /// Wraps the record.
    fn into_record(self) -> Record;

    /// Unwraps the record, or `None` if it belongs to another collection.
    fn from_record(record: Record) -> Option<Self>;
}

/// Read set plus staged writes of one attempt.
///
/// Every key read is remembered at the version first observed. Writes are
/// staged locally and visible to later reads in the same transaction.
pub struct Transaction {
    store: Arc<dyn LedgerStore>,
    reads: HashMap<RecordKey, u64>,
    staged: BTreeMap<RecordKey, Option<Record>>,
}

impl Transaction {
    /// Starts an empty transaction against `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            reads: HashMap::new(),
            staged: BTreeMap::new(),
        }
    }

    /// Reads a record, seeing this transaction's own staged writes.
    pub async fn read(&mut self, key: &RecordKey) -> Result<Option<Record>, StoreError> {
        if let Some(staged) = self.staged.get(key) {
            return Ok(staged.clone());
        }
        let found = self.store.read(key).await?;
        let version = found.as_ref().map_or(0, |v| v.version);
        self.reads.entry(*key).or_insert(version);
        Ok(found.map(|v| v.value))
    }

    /// Reads and unwraps a typed record.
    pub async fn get<D: Document>(&mut self, id: D::Id) -> Result<Option<D>, StoreError> {
        let key = D::key_of(id);
        match self.read(&key).await? {
            None => Ok(None),
            Some(record) => D::from_record(record).map(Some).ok_or_else(|| StoreError::Corrupt {
                key: key.to_string(),
                reason: "record stored in the wrong collection".to_string(),
            }),
        }
    }

    /// Stages an insert or replace.
    pub fn put<D: Document>(&mut self, doc: D) {
        let key = doc.key();
        self.staged.insert(key, Some(doc.into_record()));
    }

    /// Stages a delete.
    ///
    /// The key is read first unless this transaction already saw it, so the
    /// commit expects the version that is actually being removed.
    pub async fn delete<D: Document>(&mut self, id: D::Id) -> Result<(), StoreError> {
        let key = D::key_of(id);
        if !self.staged.contains_key(&key) && !self.reads.contains_key(&key) {
            self.read(&key).await?;
        }
        self.staged.insert(key, None);
        Ok(())
    }

    /// Returns true if nothing has been staged.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.staged.is_empty()
    }

    /// Turns the transaction into a commit batch.
    ///
    /// Keys put without being read are expected to be absent, so two
    /// transactions can never both create the same record.
    #[must_use]
    pub fn into_batch(self) -> CommitBatch {
        let mut reads = self.reads;
        for key in self.staged.keys() {
            reads.entry(*key).or_insert(0);
        }
        let mut expected: Vec<_> = reads.into_iter().collect();
        expected.sort_unstable_by_key(|(key, _)| *key);

        let writes = self
            .staged
            .into_iter()
            .map(|(key, record)| match record {
                Some(record) => Write::Put(record),
                None => Write::Delete(key),
            })
            .collect();

        CommitBatch { expected, writes }
    }

    /// Commits the staged writes. Read-only transactions commit trivially.
    pub async fn commit(self) -> Result<(), StoreError> {
        if self.is_read_only() {
            return Ok(());
        }
        let store = Arc::clone(&self.store);
        store.apply(self.into_batch()).await
    }
}

/// Runs `op` as one isolated, all-or-nothing unit.
///
/// `op` receives a fresh [`Transaction`], reads what it needs, stages its
/// writes and hands the transaction back. If the commit conflicts, the whole
/// `op` runs again from scratch, up to `max_attempts` times; the final
/// conflict is returned through `E: From<StoreError>`.
pub async fn atomic<T, E, F, Fut>(
    store: &Arc<dyn LedgerStore>,
    max_attempts: u32,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut(Transaction) -> Fut,
    Fut: Future<Output = Result<(Transaction, T), E>>,
    E: From<StoreError>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let (txn, value) = op(Transaction::new(Arc::clone(store))).await?;
        match txn.commit().await {
            Ok(()) => {
                debug!(attempt, "atomic operation committed");
                return Ok(value);
            }
            Err(StoreError::Conflict { key }) if attempt < max_attempts => {
                warn!(attempt, max_attempts, key = %key, "commit conflicted, retrying");
                attempt += 1;
            }
            Err(e) => return Err(E::from(e)),
        }
    }
}
