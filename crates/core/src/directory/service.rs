//! Entity directory service.

use std::sync::Arc;

use chrono::Utc;
use khata_shared::types::CounterpartyId;
use tracing::info;

use super::error::DirectoryError;
use super::types::{Counterparty, CounterpartyKind, NewCounterparty};
use crate::actor::ActorContext;
use crate::store::{LedgerStore, Transaction, atomic};

/// Customers and sellers of one store.
#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<dyn LedgerStore>,
    max_attempts: u32,
}

impl DirectoryService {
    /// Creates a directory service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts,
        }
    }

    /// Looks up a counterparty of the actor's company.
    pub async fn lookup_by_id(
        &self,
        actor: &ActorContext,
        id: CounterpartyId,
    ) -> Result<Counterparty, DirectoryError> {
        let mut txn = Transaction::new(Arc::clone(&self.store));
        txn.get::<Counterparty>(id)
            .await?
            .filter(|c| c.company_id == actor.company_id)
            .ok_or(DirectoryError::CounterpartyNotFound(id))
    }

    /// Lists counterparties sorted by name.
    pub async fn list_all(
        &self,
        actor: &ActorContext,
        kind: Option<CounterpartyKind>,
    ) -> Result<Vec<Counterparty>, DirectoryError> {
        let mut all = self
            .store
            .list_counterparties(actor.company_id, kind)
            .await?;
        all.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(all)
    }

    /// Creates a counterparty.
    pub async fn create(
        &self,
        actor: &ActorContext,
        input: NewCounterparty,
    ) -> Result<Counterparty, DirectoryError> {
        if input.name.trim().is_empty() {
            return Err(DirectoryError::EmptyName);
        }

        let created = atomic(&self.store, self.max_attempts, |mut txn| {
            let input = &input;
            async move {
                let counterparty = Counterparty::new(
                    actor.company_id,
                    input.kind,
                    &input.name,
                    input.phone.as_deref(),
                    Utc::now(),
                );
                txn.put(counterparty.clone());
                Ok::<_, DirectoryError>((txn, counterparty))
            }
        })
        .await?;

        info!(counterparty_id = %created.id, kind = %created.kind, "counterparty created");
        Ok(created)
    }
}
