//! Read-only ledger queries.

use std::sync::Arc;

use chrono::NaiveDate;
use khata_shared::types::{CounterpartyId, LedgerEntryId, PageRequest, PageResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ReportError;
use super::filter::{EntryFilter, is_visible_to};
use crate::actor::ActorContext;
use crate::audit::AuditLog;
use crate::ledger::{EntryPurpose, EntryType, LedgerEntry};
use crate::payments::{PaymentRecord, PaymentRecordType};
use crate::store::{EntryQuery, LedgerStore};
use crate::workflow::{RequestStatus, UpdateRequest};

/// Totals of one business day, as visible to one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    /// Business date.
    pub date: NaiveDate,
    /// Grand totals of sales.
    pub sales_total: Decimal,
    /// Grand totals of purchases.
    pub purchases_total: Decimal,
    /// GST on both.
    pub tax_total: Decimal,
    /// Money received that day, including settlements.
    pub money_in: Decimal,
    /// Money paid out that day, including settlements.
    pub money_out: Decimal,
    /// Still owed on the day's sales.
    pub outstanding_receivable: Decimal,
    /// Still owed on the day's purchases.
    pub outstanding_payable: Decimal,
    /// Entries counted.
    pub entry_count: usize,
}

impl DailySummary {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            sales_total: Decimal::ZERO,
            purchases_total: Decimal::ZERO,
            tax_total: Decimal::ZERO,
            money_in: Decimal::ZERO,
            money_out: Decimal::ZERO,
            outstanding_receivable: Decimal::ZERO,
            outstanding_payable: Decimal::ZERO,
            entry_count: 0,
        }
    }

    fn add(&mut self, entry: &LedgerEntry) {
        self.entry_count += 1;
        match (entry.entry_purpose, entry.entry_type) {
            (EntryPurpose::LedgerRecord, EntryType::Sale) => {
                self.sales_total += entry.grand_total;
                self.tax_total += entry.tax_amount;
                // Later settlements show up on their own date.
                self.money_in += entry.amount_paid_now - entry.settled_amount;
                self.outstanding_receivable += entry.remaining_amount;
            }
            (EntryPurpose::LedgerRecord, EntryType::Purchase) => {
                self.purchases_total += entry.grand_total;
                self.tax_total += entry.tax_amount;
                self.money_out += entry.amount_paid_now - entry.settled_amount;
                self.outstanding_payable += entry.remaining_amount;
            }
            (EntryPurpose::PaymentRecord, EntryType::Sale) => self.money_in += entry.grand_total,
            (EntryPurpose::PaymentRecord, EntryType::Purchase) => {
                self.money_out += entry.grand_total;
            }
        }
    }
}

/// Ledger listings, summaries and histories.
#[derive(Clone)]
pub struct LedgerQueryService {
    store: Arc<dyn LedgerStore>,
    default_page_size: u32,
}

impl LedgerQueryService {
    /// Creates a query service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, default_page_size: u32) -> Self {
        Self {
            store,
            default_page_size,
        }
    }

    fn page(&self, page: Option<PageRequest>) -> PageRequest {
        page.unwrap_or_else(|| PageRequest::new(1, self.default_page_size))
    }

    /// Entries of `date` the viewer may see, unordered.
    ///
    /// Store managers are served through the `(date, type)` index so their
    /// purchase listing never loads colleagues' purchases.
    async fn visible_entries_on(
        &self,
        viewer: &ActorContext,
        date: NaiveDate,
    ) -> Result<Vec<LedgerEntry>, ReportError> {
        let company_id = viewer.company_id;
        let mut entries = if viewer.is_privileged() {
            self.store
                .query_entries(company_id, &EntryQuery::ByDate(date))
                .await?
        } else {
            let mut sales = self
                .store
                .query_entries(company_id, &EntryQuery::ByDateAndType(date, EntryType::Sale))
                .await?;
            let purchases = self
                .store
                .query_entries(
                    company_id,
                    &EntryQuery::ByDateAndType(date, EntryType::Purchase),
                )
                .await?;
            sales.extend(purchases);
            sales
        };
        entries.retain(|e| is_visible_to(viewer, e));
        Ok(entries)
    }

    /// Lists the entries of one business date, newest first.
    pub async fn entries_for_date(
        &self,
        viewer: &ActorContext,
        date: NaiveDate,
        filter: &EntryFilter,
        page: Option<PageRequest>,
    ) -> Result<PageResponse<LedgerEntry>, ReportError> {
        let mut entries = self.visible_entries_on(viewer, date).await?;
        entries.retain(|e| filter.matches(e));
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        debug!(date = %date, matched = entries.len(), "listed entries");
        Ok(self.page(page).paginate(entries))
    }

    /// Pending and partial entries of one counterparty, oldest first.
    pub async fn outstanding_entries(
        &self,
        viewer: &ActorContext,
        entity_id: CounterpartyId,
        entry_type: EntryType,
    ) -> Result<Vec<LedgerEntry>, ReportError> {
        let mut entries = self
            .store
            .query_entries(
                viewer.company_id,
                &EntryQuery::Outstanding {
                    entity_id,
                    entry_type,
                },
            )
            .await?;
        entries.retain(|e| e.entry_purpose == EntryPurpose::LedgerRecord && is_visible_to(viewer, e));
        entries.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(entries)
    }

    /// Totals of one business day under the same visibility rule as the listing.
    pub async fn daily_summary(
        &self,
        viewer: &ActorContext,
        date: NaiveDate,
    ) -> Result<DailySummary, ReportError> {
        let entries = self.visible_entries_on(viewer, date).await?;
        let mut summary = DailySummary::empty(date);
        for entry in &entries {
            summary.add(entry);
        }
        Ok(summary)
    }

    /// Payment records of one counterparty, newest first.
    ///
    /// Store managers see supplier payments only when they recorded them.
    pub async fn payment_history(
        &self,
        viewer: &ActorContext,
        entity_id: CounterpartyId,
        page: Option<PageRequest>,
    ) -> Result<PageResponse<PaymentRecord>, ReportError> {
        let mut records = self
            .store
            .payment_records_for(viewer.company_id, entity_id)
            .await?;
        records.retain(|r| {
            viewer.is_privileged()
                || r.record_type == PaymentRecordType::Customer
                || r.created_by_uid == viewer.uid
        });
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(self.page(page).paginate(records))
    }

    /// Change requests waiting for an admin, newest first.
    pub async fn pending_requests(
        &self,
        viewer: &ActorContext,
        page: Option<PageRequest>,
    ) -> Result<PageResponse<UpdateRequest>, ReportError> {
        if !viewer.is_privileged() {
            return Err(ReportError::PermissionDenied(
                "only admins can review change requests".to_string(),
            ));
        }
        let mut requests = self
            .store
            .update_requests(viewer.company_id, Some(RequestStatus::Pending))
            .await?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(self.page(page).paginate(requests))
    }

    /// Audit records of one entry, oldest first.
    pub async fn audit_trail(
        &self,
        viewer: &ActorContext,
        entry_id: LedgerEntryId,
    ) -> Result<Vec<AuditLog>, ReportError> {
        if !viewer.is_privileged() {
            return Err(ReportError::PermissionDenied(
                "only admins can read the audit trail".to_string(),
            ));
        }
        let mut logs = self
            .store
            .audit_logs_for(viewer.company_id, entry_id)
            .await?;
        logs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(logs)
    }
}
