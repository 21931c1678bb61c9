//! Approval controller.
//!
//! Store managers may change only their own unpaid entries directly; every
//! other edit or delete becomes an [`UpdateRequest`] that an admin approves
//! or rejects. Approval applies the change through the ledger engine in the
//! same commit that closes the request.

use std::sync::Arc;

use chrono::Utc;
use khata_shared::types::{LedgerEntryId, UpdateRequestId};
use rust_decimal::Decimal;
use tracing::{debug, error, info};

use crate::actor::ActorContext;
use crate::audit::{AuditAction, AuditLog};
use crate::ledger::service::load_entry;
use crate::ledger::{
    DeleteOutcome, EntryPurpose, LedgerEngine, LedgerEntry, LedgerEntryInput, LedgerError,
    ValidationError, validate_entry_input,
};
use crate::notify::{ActorDirectory, Notification, NotificationSink};
use crate::store::atomic;
use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{
    ChangeOutcome, Decision, PendingRequestIndex, RequestStatus, RequestType, UpdateRequest,
};

/// Routes entry changes either straight to the engine or through approval.
#[derive(Clone)]
pub struct ApprovalController {
    engine: LedgerEngine,
    notifier: Arc<dyn NotificationSink>,
    actors: Arc<dyn ActorDirectory>,
}

impl ApprovalController {
    /// Creates a controller.
    #[must_use]
    pub fn new(
        engine: LedgerEngine,
        notifier: Arc<dyn NotificationSink>,
        actors: Arc<dyn ActorDirectory>,
    ) -> Self {
        Self {
            engine,
            notifier,
            actors,
        }
    }

    /// Edits an entry directly when allowed, otherwise queues the edit.
    pub async fn request_update(
        &self,
        actor: &ActorContext,
        entry_id: LedgerEntryId,
        input: LedgerEntryInput,
    ) -> Result<ChangeOutcome, WorkflowError> {
        validate_entry_input(&input).map_err(LedgerError::from)?;

        let entry = self.engine.get_entry(actor, entry_id).await?;
        if actor.may_mutate_directly(&entry) {
            match self.engine.commit_entry(actor, &input, Some(entry_id)).await {
                Ok(updated) => return Ok(ChangeOutcome::Applied(updated)),
                // Settled or edited by someone else since the read.
                Err(LedgerError::PermissionDenied(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.submit_change_request(actor, entry_id, Some(input))
            .await
            .map(ChangeOutcome::Queued)
    }

    /// Deletes an entry directly when allowed, otherwise queues the delete.
    pub async fn request_delete(
        &self,
        actor: &ActorContext,
        entry_id: LedgerEntryId,
    ) -> Result<ChangeOutcome, WorkflowError> {
        let entry = match self.engine.get_entry(actor, entry_id).await {
            Ok(entry) => entry,
            Err(LedgerError::EntryNotFound(_)) => {
                return Ok(ChangeOutcome::Deleted(DeleteOutcome::AlreadyDeleted));
            }
            Err(e) => return Err(e.into()),
        };
        if actor.may_mutate_directly(&entry) {
            match self.engine.delete_entry(actor, entry_id).await {
                Ok(outcome) => return Ok(ChangeOutcome::Deleted(outcome)),
                Err(LedgerError::PermissionDenied(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.submit_change_request(actor, entry_id, None)
            .await
            .map(ChangeOutcome::Queued)
    }

    /// Queues an update (`Some(input)`) or delete (`None`) of an entry.
    ///
    /// Fails with `RequestAlreadyPending` if the entry already has one.
    pub async fn submit_change_request(
        &self,
        actor: &ActorContext,
        entry_id: LedgerEntryId,
        updated_data: Option<LedgerEntryInput>,
    ) -> Result<UpdateRequest, WorkflowError> {
        let settings = self.engine.settings();
        let request = atomic(self.engine.store(), settings.max_commit_attempts, |mut txn| {
            let updated_data = &updated_data;
            async move {
                let entry = load_entry(&mut txn, actor, entry_id).await?;
                if let Some(index) = txn.get::<PendingRequestIndex>(entry_id).await? {
                    return Err(WorkflowError::Ledger(LedgerError::RequestAlreadyPending {
                        entry_id,
                        request_id: index.request_id,
                    }));
                }
                if updated_data.is_some() && entry.entry_purpose == EntryPurpose::PaymentRecord {
                    return Err(WorkflowError::Ledger(LedgerError::Validation(
                        ValidationError::PaymentEntryNotEditable(entry_id),
                    )));
                }
                if updated_data.is_some() && entry.settled_amount > Decimal::ZERO {
                    return Err(WorkflowError::Ledger(LedgerError::Validation(
                        ValidationError::SettledEntryNotEditable(entry_id),
                    )));
                }

                let request = UpdateRequest {
                    id: UpdateRequestId::new(),
                    company_id: actor.company_id,
                    request_type: if updated_data.is_some() {
                        RequestType::Update
                    } else {
                        RequestType::Delete
                    },
                    original_ledger_entry_id: entry_id,
                    original_data: entry,
                    updated_data: updated_data.clone(),
                    requested_by_uid: actor.uid,
                    requested_by_name: actor.display_name.clone(),
                    status: RequestStatus::Pending,
                    resolved_by_uid: None,
                    resolved_by_name: None,
                    resolution_note: None,
                    created_at: Utc::now(),
                    resolved_at: None,
                };
                txn.put(PendingRequestIndex {
                    entry_id,
                    request_id: request.id,
                    company_id: actor.company_id,
                });
                txn.put(request.clone());
                Ok::<_, WorkflowError>((txn, request))
            }
        })
        .await?;

        info!(
            request_id = %request.id,
            entry_id = %entry_id,
            request_type = %request.request_type,
            requested_by = %actor.uid,
            "change request submitted"
        );
        self.notify_admins(actor, &request).await;
        Ok(request)
    }

    /// Approves or rejects a pending request.
    ///
    /// Approval applies the requested change and closes the request in one
    /// commit. An update whose entry changed after the request was made is
    /// refused as stale.
    pub async fn resolve_request(
        &self,
        actor: &ActorContext,
        request_id: UpdateRequestId,
        decision: Decision,
        note: Option<String>,
    ) -> Result<UpdateRequest, WorkflowError> {
        if !actor.is_privileged() {
            return Err(WorkflowError::NotAuthorizedToResolve { user_id: actor.uid });
        }

        let settings = self.engine.settings();
        let resolved = atomic(self.engine.store(), settings.max_commit_attempts, |mut txn| {
            let note = &note;
            async move {
                let now = Utc::now();
                let mut request = txn
                    .get::<UpdateRequest>(request_id)
                    .await?
                    .filter(|r| r.company_id == actor.company_id)
                    .ok_or(LedgerError::RequestNotFound(request_id))?;
                let transition = WorkflowService::resolve(request.status, decision, actor)?;
                let entry_id = request.original_ledger_entry_id;

                request.status = transition.new_status;
                request.resolved_by_uid = Some(transition.resolved_by);
                request.resolved_by_name = Some(actor.display_name.clone());
                request.resolution_note = note
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string);
                request.resolved_at = Some(transition.resolved_at);
                txn.delete::<PendingRequestIndex>(entry_id).await?;

                let action = match decision {
                    Decision::Approve => AuditAction::RequestApproved,
                    Decision::Reject => AuditAction::RequestRejected,
                };
                let mut audit = AuditLog::new(actor, action, entry_id, now);
                audit.request_id = Some(request.id);
                audit.note.clone_from(&request.resolution_note);

                if decision == Decision::Approve {
                    let live = txn
                        .get::<LedgerEntry>(entry_id)
                        .await?
                        .filter(|e| e.company_id == actor.company_id);
                    match request.request_type {
                        RequestType::Update => {
                            let live = live.ok_or(LedgerError::EntryNotFound(entry_id))?;
                            if live.updated_at != request.original_data.updated_at {
                                return Err(WorkflowError::StaleRequest {
                                    request_id,
                                    entry_id,
                                });
                            }
                            let input = request
                                .updated_data
                                .as_ref()
                                .ok_or(WorkflowError::MissingUpdateData(request_id))?;
                            audit.entry_snapshot = Some(live.clone());
                            self.engine
                                .stage_commit(&mut txn, actor, input, Some(live), now)
                                .await?;
                        }
                        RequestType::Delete => match live {
                            Some(live) => {
                                self.engine.stage_delete(&mut txn, actor, live, now).await?;
                            }
                            None => debug!(entry_id = %entry_id, "entry already deleted"),
                        },
                    }
                }

                txn.put(audit);
                txn.put(request.clone());
                Ok::<_, WorkflowError>((txn, request))
            }
        })
        .await?;

        info!(
            request_id = %resolved.id,
            entry_id = %resolved.original_ledger_entry_id,
            status = %resolved.status,
            resolved_by = %actor.uid,
            "change request resolved"
        );
        self.notify_requester(&resolved).await;
        Ok(resolved)
    }

    async fn notify_admins(&self, actor: &ActorContext, request: &UpdateRequest) {
        let recipients = match self.actors.privileged_actors(actor.company_id).await {
            Ok(ids) => ids.into_iter().filter(|id| *id != actor.uid).collect::<Vec<_>>(),
            Err(e) => {
                error!(request_id = %request.id, error = %e, "could not resolve approvers");
                return;
            }
        };
        if recipients.is_empty() {
            return;
        }

        let entry = &request.original_data;
        let notification = Notification {
            recipient_ids: recipients,
            title: "Approval needed".to_string(),
            message: format!(
                "{} asked to {} the {} entry for {} ({})",
                request.requested_by_name,
                request.request_type,
                entry.entry_type,
                entry.entity_name,
                entry.grand_total
            ),
            link: Some(format!("/approvals/{}", request.id)),
        };
        self.deliver(&notification).await;
    }

    async fn notify_requester(&self, request: &UpdateRequest) {
        let verdict = match request.status {
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Pending => return,
        };
        let mut message = format!(
            "Your request to {} the entry for {} was {verdict}",
            request.request_type, request.original_data.entity_name
        );
        if let Some(note) = &request.resolution_note {
            message.push_str(": ");
            message.push_str(note);
        }

        let notification = Notification {
            recipient_ids: vec![request.requested_by_uid],
            title: format!("Change request {verdict}"),
            message,
            link: Some(format!("/ledger/{}", request.original_ledger_entry_id)),
        };
        self.deliver(&notification).await;
    }

    async fn deliver(&self, notification: &Notification) {
        if let Err(e) = self.notifier.notify(notification).await {
            error!(title = %notification.title, error = %e, "notification not delivered");
        }
    }
}
