//! Audit trail records.
//!
//! Written in the same commit as the mutation they describe.

use chrono::{DateTime, Utc};
use khata_shared::types::{AuditLogId, CompanyId, LedgerEntryId, ProductId, UpdateRequestId, UserId};
use serde::{Deserialize, Serialize};

use crate::actor::ActorContext;
use crate::ledger::LedgerEntry;
use crate::payments::PaymentApplication;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A ledger entry was deleted and its effects reversed.
    EntryDeleted,
    /// A change request was approved and applied.
    RequestApproved,
    /// A change request was rejected.
    RequestRejected,
}

/// Stock of one product before and after a reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReversal {
    /// Product whose stock moved.
    pub product_id: ProductId,
    /// Product name at reversal time.
    pub product_name: String,
    /// Units before.
    pub before: i64,
    /// Units after.
    pub after: i64,
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    /// Record id.
    pub id: AuditLogId,
    /// Owning company.
    pub company_id: CompanyId,
    /// What happened.
    pub action: AuditAction,
    /// Entry concerned.
    pub ledger_entry_id: LedgerEntryId,
    /// Request concerned, for workflow resolutions.
    pub request_id: Option<UpdateRequestId>,
    /// Entry as it was before the action.
    pub entry_snapshot: Option<LedgerEntry>,
    /// Stock reversed by a delete.
    #[serde(default)]
    pub stock_reversals: Vec<StockReversal>,
    /// Settlements handed back by deleting a payment application.
    #[serde(default)]
    pub settlements_reverted: Vec<PaymentApplication>,
    /// Acting user.
    pub actor_uid: UserId,
    /// Acting user's display name.
    pub actor_name: String,
    /// Free-form note.
    pub note: Option<String>,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    /// Starts an audit record for `action` on `entry_id` by `actor`.
    #[must_use]
    pub fn new(
        actor: &ActorContext,
        action: AuditAction,
        ledger_entry_id: LedgerEntryId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditLogId::new(),
            company_id: actor.company_id,
            action,
            ledger_entry_id,
            request_id: None,
            entry_snapshot: None,
            stock_reversals: Vec::new(),
            settlements_reverted: Vec::new(),
            actor_uid: actor.uid,
            actor_name: actor.display_name.clone(),
            note: None,
            created_at: now,
        }
    }
}
