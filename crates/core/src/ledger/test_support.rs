//! Builders shared by tests across the crate.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use khata_shared::types::{CompanyId, LedgerEntryId, ProductId, UserId};
use rust_decimal::Decimal;

use super::service::{LedgerEngine, LedgerSettings};
use super::types::{
    CounterpartySelection, EntityType, EntryPurpose, EntryType, LedgerEntry, LedgerEntryInput,
    LineItem, LineItemInput, PaymentMethod, PaymentStatus,
};
use crate::actor::{ActorContext, ActorRole};
use crate::catalog::{CatalogService, NewProduct, Product};
use crate::directory::{Counterparty, CounterpartyKind, DirectoryService, NewCounterparty};
use crate::store::{Document, LedgerStore, MemoryStore, Transaction};

/// A paid, anonymous entry worth 100 with no lines.
pub(crate) fn entry_on(
    company_id: CompanyId,
    date: NaiveDate,
    entry_type: EntryType,
    created_by: UserId,
) -> LedgerEntry {
    let total = Decimal::ONE_HUNDRED;
    LedgerEntry {
        id: LedgerEntryId::new(),
        company_id,
        date,
        entry_type,
        entry_purpose: EntryPurpose::LedgerRecord,
        entity_type: EntityType::anonymous(entry_type),
        entity_id: None,
        entity_name: "Walk-in Customer".to_string(),
        items: Vec::new(),
        gst_applied: false,
        sub_total: total,
        tax_amount: Decimal::ZERO,
        grand_total: total,
        payment_status: PaymentStatus::Paid,
        payment_method: Some(PaymentMethod::Cash),
        amount_paid_now: total,
        remaining_amount: Decimal::ZERO,
        settled_amount: Decimal::ZERO,
        associated_payment_record_id: None,
        notes: None,
        created_by_uid: created_by,
        created_by_name: "Tester".to_string(),
        created_at: Utc::now(),
        updated_by_uid: None,
        updated_by_name: None,
        updated_at: None,
    }
}

/// A line of `quantity` units at `unit_price`.
pub(crate) fn line(product_id: ProductId, quantity: u32, unit_price: Decimal) -> LineItem {
    LineItem {
        product_id,
        product_name: "Test product".to_string(),
        quantity,
        unit_price,
        total_price: unit_price * Decimal::from(quantity),
        unit_of_measure: "pc".to_string(),
    }
}

/// Business date used across tests.
pub(crate) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

/// A requested line, priced from the catalog when `unit_price` is `None`.
pub(crate) fn item(product_id: ProductId, quantity: u32, unit_price: Option<Decimal>) -> LineItemInput {
    LineItemInput {
        product_id,
        quantity,
        unit_price,
    }
}

/// A paid cash entry input without GST.
pub(crate) fn entry_input(
    entry_type: EntryType,
    counterparty: CounterpartySelection,
    items: Vec<LineItemInput>,
) -> LedgerEntryInput {
    LedgerEntryInput {
        date: today(),
        entry_type,
        counterparty,
        items,
        apply_gst: false,
        payment_status: PaymentStatus::Paid,
        payment_method: Some(PaymentMethod::Cash),
        amount_paid_now: None,
        notes: None,
    }
}

/// Engine, services and two actors over one in-memory store.
pub(crate) struct Harness {
    pub store: Arc<dyn LedgerStore>,
    pub engine: LedgerEngine,
    pub catalog: CatalogService,
    pub directory: DirectoryService,
    pub admin: ActorContext,
    pub manager: ActorContext,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub(crate) fn with_store(store: Arc<dyn LedgerStore>) -> Self {
        let company_id = CompanyId::new();
        let settings = LedgerSettings {
            max_commit_attempts: 50,
            ..LedgerSettings::default()
        };
        Self {
            engine: LedgerEngine::new(Arc::clone(&store), settings),
            catalog: CatalogService::new(Arc::clone(&store), 5),
            directory: DirectoryService::new(Arc::clone(&store), 5),
            admin: ActorContext::new(UserId::new(), "Asha Admin", ActorRole::Admin, company_id),
            manager: ActorContext::new(
                UserId::new(),
                "Ravi Manager",
                ActorRole::StoreManager,
                company_id,
            ),
            store,
        }
    }

    /// Another store manager of the same company.
    pub(crate) fn other_manager(&self) -> ActorContext {
        ActorContext::new(
            UserId::new(),
            "Meena Manager",
            ActorRole::StoreManager,
            self.admin.company_id,
        )
    }

    pub(crate) async fn product(&self, name: &str, price: Decimal, stock: i64) -> Product {
        self.catalog
            .register(
                &self.admin,
                NewProduct {
                    name: name.to_string(),
                    sku: name.to_uppercase().replace(' ', "-"),
                    numeric_price: price,
                    opening_stock: stock,
                    unit_of_measure: "pc".to_string(),
                },
            )
            .await
            .unwrap()
    }

    pub(crate) async fn counterparty(&self, kind: CounterpartyKind, name: &str) -> Counterparty {
        self.directory
            .create(
                &self.admin,
                NewCounterparty {
                    kind,
                    name: name.to_string(),
                    phone: None,
                },
            )
            .await
            .unwrap()
    }

    pub(crate) async fn stock_of(&self, id: ProductId) -> i64 {
        self.catalog.get_by_id(&self.admin, id).await.unwrap().stock
    }

    pub(crate) async fn read<D: Document>(&self, id: D::Id) -> Option<D> {
        let mut txn = Transaction::new(Arc::clone(&self.store));
        txn.get::<D>(id).await.unwrap()
    }
}
