//! Ledger transaction engine.
//!
//! Every operation reads what it needs inside one [`Transaction`], computes
//! totals, stock and payment state, stages all writes, and commits them as a
//! single group through [`atomic`]. A failure at any step leaves the store
//! untouched; a conflicting concurrent write reruns the whole operation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use khata_shared::LedgerConfig;
use khata_shared::types::{
    AuditLogId, CounterpartyId, Currency, LedgerEntryId, PaymentRecordId, ProductId, round_money,
};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::error::{LedgerError, ValidationError};
use super::totals::{compute_totals, line_total, split_payment};
use super::types::{
    CounterpartySelection, EntityType, EntryPurpose, EntryType, LedgerEntry, LedgerEntryInput,
    LineItem, PaymentApplicationInput, PaymentMethod, PaymentStatus,
};
use super::validation::{validate_entry_input, validate_payment_input};
use crate::actor::ActorContext;
use crate::audit::{AuditAction, AuditLog, StockReversal};
use crate::catalog::{Product, checked_stock, net_stock_deltas};
use crate::directory::Counterparty;
use crate::payments::{
    OutstandingBalance, PaymentRecord, PaymentRecordStatus, PaymentRecordType, allocate,
};
use crate::store::{LedgerStore, Transaction, atomic};
use crate::workflow::{PendingRequestIndex, RequestStatus, UpdateRequest};

/// Display name for anonymous customers.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";
/// Display name for anonymous sellers.
pub const UNKNOWN_SELLER: &str = "Unknown Seller";

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// GST rate applied when an entry opts in.
    pub tax_rate: Decimal,
    /// Attempts before a conflict surfaces as `ConcurrentModification`.
    pub max_commit_attempts: u32,
    /// Currency used when rendering amounts.
    pub currency: Currency,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for LedgerSettings {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            tax_rate: config.tax_rate,
            max_commit_attempts: config.max_commit_attempts,
            currency: config.currency,
        }
    }
}

/// Result of [`LedgerEngine::delete_entry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The entry was deleted and its effects reversed.
    Deleted {
        /// Audit record written with the delete.
        audit_log_id: AuditLogId,
    },
    /// Nothing to do; the entry was already gone.
    AlreadyDeleted,
}

/// Result of [`LedgerEngine::apply_payment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSettlement {
    /// Payment-purpose entry listing the payment on its date.
    pub entry: LedgerEntry,
    /// Standalone payment record with per-entry amounts.
    pub record: PaymentRecord,
}

/// The ledger transaction engine.
#[derive(Clone)]
pub struct LedgerEngine {
    store: Arc<dyn LedgerStore>,
    settings: LedgerSettings,
}

impl LedgerEngine {
    /// Creates an engine over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, settings: LedgerSettings) -> Self {
        Self { store, settings }
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Returns the engine settings.
    #[must_use]
    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// Reads one entry of the actor's company.
    pub async fn get_entry(
        &self,
        actor: &ActorContext,
        id: LedgerEntryId,
    ) -> Result<LedgerEntry, LedgerError> {
        let mut txn = Transaction::new(Arc::clone(&self.store));
        load_entry(&mut txn, actor, id).await
    }

    /// Validates and atomically commits a new entry, or an edit of `existing`.
    ///
    /// Editing requires the actor to be allowed to mutate the entry directly;
    /// otherwise the edit must go through the approval workflow.
    pub async fn commit_entry(
        &self,
        actor: &ActorContext,
        input: &LedgerEntryInput,
        existing: Option<LedgerEntryId>,
    ) -> Result<LedgerEntry, LedgerError> {
        validate_entry_input(input)?;

        let entry = atomic(&self.store, self.settings.max_commit_attempts, |mut txn| async move {
            let previous = match existing {
                Some(id) => {
                    let old = load_entry(&mut txn, actor, id).await?;
                    if !actor.may_mutate_directly(&old) {
                        return Err(LedgerError::PermissionDenied(format!(
                            "{} may not edit entry {id} without approval",
                            actor.display_name
                        )));
                    }
                    Some(old)
                }
                None => None,
            };
            let entry = self
                .stage_commit(&mut txn, actor, input, previous, Utc::now())
                .await?;
            Ok::<_, LedgerError>((txn, entry))
        })
        .await?;

        info!(
            entry_id = %entry.id,
            entry_type = %entry.entry_type,
            grand_total = %entry.grand_total,
            payment_status = %entry.payment_status,
            edited = existing.is_some(),
            "ledger entry committed"
        );
        Ok(entry)
    }

    /// Spreads a payment over selected pending or partial entries of one
    /// counterparty, in the order given.
    ///
    /// A payment larger than what the selected entries owe is rejected.
    pub async fn apply_payment(
        &self,
        actor: &ActorContext,
        input: &PaymentApplicationInput,
    ) -> Result<PaymentSettlement, LedgerError> {
        validate_payment_input(input)?;
        let amount = round_money(input.amount);

        let settlement = atomic(&self.store, self.settings.max_commit_attempts, |mut txn| async move {
            let now = Utc::now();
            let expected = input.entry_type.counterparty_kind();
            let counterparty = txn
                .get::<Counterparty>(input.entity_id)
                .await?
                .filter(|c| c.company_id == actor.company_id)
                .ok_or(LedgerError::EntityNotFound(input.entity_id))?;
            if counterparty.kind != expected {
                return Err(LedgerError::Validation(ValidationError::EntityKindMismatch {
                    expected,
                    actual: counterparty.kind,
                }));
            }

            let mut selected = Vec::with_capacity(input.selected_entry_ids.len());
            for id in &input.selected_entry_ids {
                let entry = load_entry(&mut txn, actor, *id).await?;
                if entry.entry_purpose != EntryPurpose::LedgerRecord
                    || entry.entity_id != Some(input.entity_id)
                    || entry.entry_type != input.entry_type
                {
                    return Err(LedgerError::Validation(ValidationError::EntryEntityMismatch(*id)));
                }
                if !entry.is_outstanding() {
                    return Err(LedgerError::Validation(ValidationError::EntryNotOutstanding(*id)));
                }
                selected.push(entry);
            }

            let balances: Vec<OutstandingBalance> = selected
                .iter()
                .map(|e| OutstandingBalance {
                    ledger_entry_id: e.id,
                    remaining: e.remaining_amount,
                })
                .collect();
            let outstanding: Decimal = balances.iter().map(|b| b.remaining).sum();
            let allocation = allocate(amount, &balances);
            if allocation.unapplied > Decimal::ZERO {
                return Err(LedgerError::Validation(ValidationError::Overpayment {
                    requested: amount,
                    outstanding,
                }));
            }

            let applied: HashMap<LedgerEntryId, Decimal> = allocation
                .applications
                .iter()
                .map(|a| (a.ledger_entry_id, a.amount))
                .collect();
            for mut entry in selected {
                if let Some(share) = applied.get(&entry.id) {
                    apply_settlement(&mut entry, *share, input.method, actor, now);
                    sync_linked_record(&mut txn, &entry, now).await?;
                    txn.put(entry);
                }
            }

            let total_applied = allocation.total_applied();
            let entry_id = LedgerEntryId::new();
            let record = PaymentRecord {
                id: PaymentRecordId::new(),
                company_id: actor.company_id,
                record_type: PaymentRecordType::for_entry_type(input.entry_type),
                related_entity_id: Some(counterparty.id),
                related_entity_name: counterparty.name.clone(),
                amount_paid: total_applied,
                method: input.method,
                status: match input.entry_type {
                    EntryType::Sale => PaymentRecordStatus::Received,
                    EntryType::Purchase => PaymentRecordStatus::Sent,
                },
                ledger_entry_id: Some(entry_id),
                applications: allocation.applications,
                original_invoice_amount: outstanding,
                remaining_balance_on_invoice: outstanding - total_applied,
                notes: clean_notes(input.notes.as_deref()),
                created_by_uid: actor.uid,
                created_at: now,
                updated_at: now,
            };
            let entry = LedgerEntry {
                id: entry_id,
                company_id: actor.company_id,
                date: input.date,
                entry_type: input.entry_type,
                entry_purpose: EntryPurpose::PaymentRecord,
                entity_type: EntityType::known(counterparty.kind),
                entity_id: Some(counterparty.id),
                entity_name: counterparty.name,
                items: Vec::new(),
                gst_applied: false,
                sub_total: total_applied,
                tax_amount: Decimal::ZERO,
                grand_total: total_applied,
                payment_status: PaymentStatus::Paid,
                payment_method: Some(input.method),
                amount_paid_now: total_applied,
                remaining_amount: Decimal::ZERO,
                settled_amount: Decimal::ZERO,
                associated_payment_record_id: Some(record.id),
                notes: record.notes.clone(),
                created_by_uid: actor.uid,
                created_by_name: actor.display_name.clone(),
                created_at: now,
                updated_by_uid: None,
                updated_by_name: None,
                updated_at: None,
            };

            txn.put(record.clone());
            txn.put(entry.clone());
            Ok::<_, LedgerError>((txn, PaymentSettlement { entry, record }))
        })
        .await?;

        info!(
            entry_id = %settlement.entry.id,
            payment_record_id = %settlement.record.id,
            amount = %settlement.record.amount_paid,
            settled = settlement.record.applications.len(),
            "payment applied"
        );
        Ok(settlement)
    }

    /// Deletes an entry and reverses its effects.
    ///
    /// Deleting an id that no longer exists succeeds as a no-op, so retries
    /// never double-revert stock.
    pub async fn delete_entry(
        &self,
        actor: &ActorContext,
        id: LedgerEntryId,
    ) -> Result<DeleteOutcome, LedgerError> {
        let outcome = atomic(&self.store, self.settings.max_commit_attempts, |mut txn| async move {
            let Some(entry) = txn
                .get::<LedgerEntry>(id)
                .await?
                .filter(|e| e.company_id == actor.company_id)
            else {
                return Ok((txn, DeleteOutcome::AlreadyDeleted));
            };
            if !actor.may_mutate_directly(&entry) {
                return Err(LedgerError::PermissionDenied(format!(
                    "{} may not delete entry {id} without approval",
                    actor.display_name
                )));
            }
            let audit = self.stage_delete(&mut txn, actor, entry, Utc::now()).await?;
            Ok::<_, LedgerError>((
                txn,
                DeleteOutcome::Deleted {
                    audit_log_id: audit.id,
                },
            ))
        })
        .await?;

        match outcome {
            DeleteOutcome::Deleted { audit_log_id } => {
                info!(entry_id = %id, audit_log_id = %audit_log_id, "ledger entry deleted");
            }
            DeleteOutcome::AlreadyDeleted => debug!(entry_id = %id, "ledger entry already deleted"),
        }
        Ok(outcome)
    }

    /// Stages a create (or an edit of `previous`) into `txn`.
    ///
    /// Permission checks are the caller's job.
    pub(crate) async fn stage_commit(
        &self,
        txn: &mut Transaction,
        actor: &ActorContext,
        input: &LedgerEntryInput,
        previous: Option<LedgerEntry>,
        now: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        if let Some(old) = &previous
            && old.entry_purpose == EntryPurpose::PaymentRecord
        {
            return Err(ValidationError::PaymentEntryNotEditable(old.id).into());
        }
        if let Some(old) = &previous
            && old.settled_amount > Decimal::ZERO
        {
            return Err(ValidationError::SettledEntryNotEditable(old.id).into());
        }
        validate_entry_input(input)?;

        let (entity_type, entity_id, entity_name) =
            resolve_counterparty(txn, actor, input, now).await?;

        // 1. Load every product touched by the new lines and the old ones.
        let mut products: BTreeMap<ProductId, Product> = BTreeMap::new();
        for item in &input.items {
            if !products.contains_key(&item.product_id) {
                let product = load_product(txn, actor, item.product_id)
                    .await?
                    .ok_or(LedgerError::ProductNotFound(item.product_id))?;
                products.insert(product.id, product);
            }
        }
        if let Some(old) = &previous {
            for item in &old.items {
                if products.contains_key(&item.product_id) {
                    continue;
                }
                match load_product(txn, actor, item.product_id).await? {
                    Some(product) => {
                        products.insert(product.id, product);
                    }
                    None => warn!(
                        entry_id = %old.id,
                        product_id = %item.product_id,
                        "product no longer exists, skipping its stock reversal"
                    ),
                }
            }
        }

        // 2. Price the lines, snapshotting name and unit.
        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let product = products
                .get(&item.product_id)
                .ok_or(LedgerError::ProductNotFound(item.product_id))?;
            let unit_price = round_money(item.unit_price.unwrap_or(product.numeric_price));
            items.push(LineItem {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity: item.quantity,
                unit_price,
                total_price: line_total(item.quantity, unit_price),
                unit_of_measure: product.unit_of_measure.clone(),
            });
        }

        // 3. Reverse the old lines, apply the new ones, keep stock >= 0.
        let deltas = net_stock_deltas(
            previous
                .as_ref()
                .map(|old| (old.entry_type, old.items.as_slice())),
            Some((input.entry_type, items.as_slice())),
        );
        for (product_id, delta) in deltas {
            let Some(product) = products.get_mut(&product_id) else {
                continue;
            };
            product.stock = checked_stock(product.stock, delta).ok_or(
                LedgerError::InsufficientStock {
                    product_id,
                    available: product.stock,
                    requested: -delta,
                },
            )?;
            product.updated_at = now;
            txn.put(product.clone());
        }

        // 4. Totals and payment split.
        let totals = compute_totals(&items, input.apply_gst, self.settings.tax_rate);
        let split = split_payment(
            totals.grand_total,
            input.payment_status,
            input.amount_paid_now,
        )?;

        // 5. Upsert or drop the linked payment record.
        let entry_id = previous.as_ref().map_or_else(LedgerEntryId::new, |old| old.id);
        let linked = previous
            .as_ref()
            .and_then(|old| old.associated_payment_record_id);
        let payment_method = if input.payment_status.has_payment() {
            Some(
                input
                    .payment_method
                    .ok_or(ValidationError::PaymentMethodRequired)?,
            )
        } else {
            None
        };
        let notes = clean_notes(input.notes.as_deref());

        let associated_payment_record_id = match payment_method {
            Some(method) => {
                let existing = match linked {
                    Some(record_id) => txn.get::<PaymentRecord>(record_id).await?,
                    None => None,
                };
                let mut record = existing.unwrap_or_else(|| PaymentRecord {
                    id: PaymentRecordId::new(),
                    company_id: actor.company_id,
                    record_type: PaymentRecordType::for_entry_type(input.entry_type),
                    related_entity_id: None,
                    related_entity_name: String::new(),
                    amount_paid: Decimal::ZERO,
                    method,
                    status: PaymentRecordStatus::Pending,
                    ledger_entry_id: Some(entry_id),
                    applications: Vec::new(),
                    original_invoice_amount: Decimal::ZERO,
                    remaining_balance_on_invoice: Decimal::ZERO,
                    notes: None,
                    created_by_uid: actor.uid,
                    created_at: now,
                    updated_at: now,
                });
                record.record_type = PaymentRecordType::for_entry_type(input.entry_type);
                record.related_entity_id = entity_id;
                record.related_entity_name.clone_from(&entity_name);
                record.amount_paid = split.amount_paid_now;
                record.method = method;
                record.status = if split.remaining_amount.is_zero() {
                    PaymentRecordStatus::Completed
                } else {
                    PaymentRecordStatus::Partial
                };
                record.original_invoice_amount = totals.grand_total;
                record.remaining_balance_on_invoice = split.remaining_amount;
                record.notes.clone_from(&notes);
                record.updated_at = now;
                let record_id = record.id;
                txn.put(record);
                Some(record_id)
            }
            None => {
                if let Some(record_id) = linked {
                    txn.delete::<PaymentRecord>(record_id).await?;
                }
                None
            }
        };

        // 6. The entry itself, with audit stamps.
        let mut entry = LedgerEntry {
            id: entry_id,
            company_id: actor.company_id,
            date: input.date,
            entry_type: input.entry_type,
            entry_purpose: EntryPurpose::LedgerRecord,
            entity_type,
            entity_id,
            entity_name,
            items,
            gst_applied: input.apply_gst,
            sub_total: totals.sub_total,
            tax_amount: totals.tax_amount,
            grand_total: totals.grand_total,
            payment_status: input.payment_status,
            payment_method,
            amount_paid_now: split.amount_paid_now,
            remaining_amount: split.remaining_amount,
            settled_amount: Decimal::ZERO,
            associated_payment_record_id,
            notes,
            created_by_uid: actor.uid,
            created_by_name: actor.display_name.clone(),
            created_at: now,
            updated_by_uid: None,
            updated_by_name: None,
            updated_at: None,
        };
        if let Some(old) = previous {
            entry.created_by_uid = old.created_by_uid;
            entry.created_by_name = old.created_by_name;
            entry.created_at = old.created_at;
            stamp_update(&mut entry, actor, now);
        }

        txn.put(entry.clone());
        Ok(entry)
    }

    /// Stages the delete of `entry` into `txn` and returns its audit record.
    ///
    /// Goods entries hand their stock back; payment applications hand their
    /// settlements back. A pending change request on the entry is rejected.
    pub(crate) async fn stage_delete(
        &self,
        txn: &mut Transaction,
        actor: &ActorContext,
        entry: LedgerEntry,
        now: DateTime<Utc>,
    ) -> Result<AuditLog, LedgerError> {
        let mut audit = AuditLog::new(actor, AuditAction::EntryDeleted, entry.id, now);

        match entry.entry_purpose {
            EntryPurpose::LedgerRecord => {
                let deltas = net_stock_deltas(Some((entry.entry_type, entry.items.as_slice())), None);
                for (product_id, delta) in deltas {
                    let Some(mut product) = load_product(txn, actor, product_id).await? else {
                        warn!(
                            entry_id = %entry.id,
                            product_id = %product_id,
                            "product no longer exists, skipping its stock reversal"
                        );
                        continue;
                    };
                    let after = checked_stock(product.stock, delta).ok_or(
                        LedgerError::InsufficientStock {
                            product_id,
                            available: product.stock,
                            requested: -delta,
                        },
                    )?;
                    audit.stock_reversals.push(StockReversal {
                        product_id,
                        product_name: product.name.clone(),
                        before: product.stock,
                        after,
                    });
                    product.stock = after;
                    product.updated_at = now;
                    txn.put(product);
                }
            }
            EntryPurpose::PaymentRecord => {
                let record = match entry.associated_payment_record_id {
                    Some(record_id) => txn.get::<PaymentRecord>(record_id).await?,
                    None => None,
                };
                for application in record.iter().flat_map(|r| r.applications.iter()) {
                    let settled = txn
                        .get::<LedgerEntry>(application.ledger_entry_id)
                        .await?
                        .filter(|e| e.company_id == actor.company_id);
                    let Some(mut settled) = settled else {
                        warn!(
                            entry_id = %application.ledger_entry_id,
                            "settled entry no longer exists, skipping its reversal"
                        );
                        continue;
                    };
                    revert_settlement(&mut settled, application.amount, actor, now);
                    sync_linked_record(txn, &settled, now).await?;
                    txn.put(settled);
                    audit.settlements_reverted.push(*application);
                }
            }
        }

        if let Some(record_id) = entry.associated_payment_record_id {
            txn.delete::<PaymentRecord>(record_id).await?;
        }

        if let Some(index) = txn.get::<PendingRequestIndex>(entry.id).await? {
            if let Some(mut request) = txn.get::<UpdateRequest>(index.request_id).await?
                && request.status == RequestStatus::Pending
            {
                request.status = RequestStatus::Rejected;
                request.resolved_by_uid = Some(actor.uid);
                request.resolved_by_name = Some(actor.display_name.clone());
                request.resolution_note = Some("Ledger entry was deleted".to_string());
                request.resolved_at = Some(now);
                info!(
                    request_id = %request.id,
                    entry_id = %entry.id,
                    "pending change request rejected by entry delete"
                );
                txn.put(request);
            }
            txn.delete::<PendingRequestIndex>(entry.id).await?;
        }

        txn.delete::<LedgerEntry>(entry.id).await?;
        audit.entry_snapshot = Some(entry);
        txn.put(audit.clone());
        Ok(audit)
    }
}

/// Reads an entry of the actor's company or fails with `EntryNotFound`.
pub(crate) async fn load_entry(
    txn: &mut Transaction,
    actor: &ActorContext,
    id: LedgerEntryId,
) -> Result<LedgerEntry, LedgerError> {
    txn.get::<LedgerEntry>(id)
        .await?
        .filter(|e| e.company_id == actor.company_id)
        .ok_or(LedgerError::EntryNotFound(id))
}

async fn load_product(
    txn: &mut Transaction,
    actor: &ActorContext,
    id: ProductId,
) -> Result<Option<Product>, LedgerError> {
    Ok(txn
        .get::<Product>(id)
        .await?
        .filter(|p| p.company_id == actor.company_id))
}

async fn resolve_counterparty(
    txn: &mut Transaction,
    actor: &ActorContext,
    input: &LedgerEntryInput,
    now: DateTime<Utc>,
) -> Result<(EntityType, Option<CounterpartyId>, String), LedgerError> {
    let expected = input.entry_type.counterparty_kind();
    match &input.counterparty {
        CounterpartySelection::Existing { id } => {
            let counterparty = txn
                .get::<Counterparty>(*id)
                .await?
                .filter(|c| c.company_id == actor.company_id)
                .ok_or(LedgerError::EntityNotFound(*id))?;
            if counterparty.kind != expected {
                return Err(ValidationError::EntityKindMismatch {
                    expected,
                    actual: counterparty.kind,
                }
                .into());
            }
            Ok((
                EntityType::known(counterparty.kind),
                Some(counterparty.id),
                counterparty.name,
            ))
        }
        CounterpartySelection::Anonymous { name } => {
            let name = name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(match input.entry_type {
                    EntryType::Sale => WALK_IN_CUSTOMER,
                    EntryType::Purchase => UNKNOWN_SELLER,
                });
            Ok((EntityType::anonymous(input.entry_type), None, name.to_string()))
        }
        CounterpartySelection::New { name, phone } => {
            let counterparty =
                Counterparty::new(actor.company_id, expected, name, phone.as_deref(), now);
            debug!(counterparty_id = %counterparty.id, "quick-creating counterparty");
            let resolved = (
                EntityType::known(expected),
                Some(counterparty.id),
                counterparty.name.clone(),
            );
            txn.put(counterparty);
            Ok(resolved)
        }
    }
}

/// Keeps the linked payment record's balance in step with a settled entry.
async fn sync_linked_record(
    txn: &mut Transaction,
    entry: &LedgerEntry,
    now: DateTime<Utc>,
) -> Result<(), LedgerError> {
    let Some(record_id) = entry.associated_payment_record_id else {
        return Ok(());
    };
    if let Some(mut record) = txn.get::<PaymentRecord>(record_id).await? {
        record.remaining_balance_on_invoice = entry.remaining_amount;
        record.status = if entry.remaining_amount.is_zero() {
            PaymentRecordStatus::Completed
        } else {
            PaymentRecordStatus::Partial
        };
        record.updated_at = now;
        txn.put(record);
    }
    Ok(())
}

fn apply_settlement(
    entry: &mut LedgerEntry,
    amount: Decimal,
    method: PaymentMethod,
    actor: &ActorContext,
    now: DateTime<Utc>,
) {
    entry.amount_paid_now += amount;
    entry.settled_amount += amount;
    entry.remaining_amount = entry.grand_total - entry.amount_paid_now;
    entry.payment_status = PaymentStatus::from_amounts(entry.amount_paid_now, entry.grand_total);
    if entry.payment_method.is_none() {
        entry.payment_method = Some(method);
    }
    stamp_update(entry, actor, now);
}

fn revert_settlement(
    entry: &mut LedgerEntry,
    amount: Decimal,
    actor: &ActorContext,
    now: DateTime<Utc>,
) {
    entry.amount_paid_now = (entry.amount_paid_now - amount).max(Decimal::ZERO);
    entry.settled_amount = (entry.settled_amount - amount).max(Decimal::ZERO);
    entry.remaining_amount = entry.grand_total - entry.amount_paid_now;
    entry.payment_status = PaymentStatus::from_amounts(entry.amount_paid_now, entry.grand_total);
    if entry.payment_status == PaymentStatus::Pending {
        entry.payment_method = None;
    }
    stamp_update(entry, actor, now);
}

fn stamp_update(entry: &mut LedgerEntry, actor: &ActorContext, now: DateTime<Utc>) {
    entry.updated_by_uid = Some(actor.uid);
    entry.updated_by_name = Some(actor.display_name.clone());
    entry.updated_at = Some(now);
}

fn clean_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}
