//! Approval controller tests against the in-memory store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use khata_shared::types::LedgerEntryId;
use rust_decimal_macros::dec;

use super::approval::ApprovalController;
use super::error::WorkflowError;
use super::types::{
    ChangeOutcome, Decision, PendingRequestIndex, RequestStatus, RequestType, UpdateRequest,
};
use crate::audit::{AuditAction, AuditLog};
use crate::directory::CounterpartyKind;
use crate::ledger::test_support::{Harness, entry_input, item, today};
use crate::ledger::{
    CounterpartySelection, DeleteOutcome, EntryType, LedgerEntry, LedgerError,
    PaymentApplicationInput, PaymentMethod, PaymentStatus, ValidationError,
};
use crate::notify::{Notification, NotificationSink, NotifyError, StaticActorDirectory};

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    fn titles(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|n| n.title.clone()).collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn notify(&self, _: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("smtp down".into()))
    }
}

fn controller(h: &Harness, sink: Arc<dyn NotificationSink>) -> ApprovalController {
    let actors = StaticActorDirectory::new().with_admin(h.admin.company_id, h.admin.uid);
    ApprovalController::new(h.engine.clone(), sink, Arc::new(actors))
}

fn anonymous() -> CounterpartySelection {
    CounterpartySelection::Anonymous { name: None }
}

#[tokio::test]
async fn test_own_pending_entry_is_edited_directly() {
    let h = Harness::new();
    let soap = h.product("Soap", dec!(30), 20).await;
    let sink = Arc::new(RecordingSink::default());
    let approvals = controller(&h, sink.clone());

    let mut input = entry_input(EntryType::Sale, anonymous(), vec![item(soap.id, 2, None)]);
    input.payment_status = PaymentStatus::Pending;
    input.payment_method = None;
    let entry = h.engine.commit_entry(&h.manager, &input, None).await.unwrap();

    input.items[0].quantity = 3;
    let outcome = approvals
        .request_update(&h.manager, entry.id, input)
        .await
        .unwrap();

    let ChangeOutcome::Applied(updated) = outcome else {
        panic!("expected a direct edit, got {outcome:?}");
    };
    assert_eq!(updated.grand_total, dec!(90));
    assert_eq!(h.stock_of(soap.id).await, 17);
    assert!(sink.titles().is_empty());
}

#[tokio::test]
async fn test_paid_entry_update_is_queued_then_approved() {
    let h = Harness::new();
    let soap = h.product("Soap", dec!(30), 20).await;
    let sink = Arc::new(RecordingSink::default());
    let approvals = controller(&h, sink.clone());

    let input = entry_input(EntryType::Sale, anonymous(), vec![item(soap.id, 2, None)]);
    let entry = h.engine.commit_entry(&h.manager, &input, None).await.unwrap();

    let mut changed = input.clone();
    changed.items[0].quantity = 5;
    let outcome = approvals
        .request_update(&h.manager, entry.id, changed)
        .await
        .unwrap();
    let ChangeOutcome::Queued(request) = outcome else {
        panic!("expected a queued request, got {outcome:?}");
    };
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.request_type, RequestType::Update);
    assert_eq!(request.original_data.id, entry.id);
    assert!(h.read::<PendingRequestIndex>(entry.id).await.is_some());
    assert_eq!(h.stock_of(soap.id).await, 18, "nothing applied while pending");
    assert_eq!(sink.titles(), vec!["Approval needed".to_string()]);
    assert_eq!(sink.sent.lock().unwrap()[0].recipient_ids, vec![h.admin.uid]);

    let resolved = approvals
        .resolve_request(&h.admin, request.id, Decision::Approve, Some("ok".into()))
        .await
        .unwrap();

    assert_eq!(resolved.status, RequestStatus::Approved);
    assert_eq!(resolved.resolved_by_uid, Some(h.admin.uid));
    assert_eq!(resolved.resolution_note.as_deref(), Some("ok"));
    assert!(h.read::<PendingRequestIndex>(entry.id).await.is_none());

    let applied = h.read::<LedgerEntry>(entry.id).await.unwrap();
    assert_eq!(applied.grand_total, dec!(150));
    assert_eq!(applied.created_by_uid, h.manager.uid);
    assert_eq!(applied.updated_by_uid, Some(h.admin.uid));
    assert_eq!(h.stock_of(soap.id).await, 15);
    assert_eq!(
        sink.titles(),
        vec![
            "Approval needed".to_string(),
            "Change request approved".to_string()
        ]
    );

    let trail = h
        .store
        .audit_logs_for(h.admin.company_id, entry.id)
        .await
        .unwrap();
    assert!(trail.iter().any(|a| a.action == AuditAction::RequestApproved));
}

#[tokio::test]
async fn test_only_one_pending_request_per_entry() {
    let h = Harness::new();
    let soap = h.product("Soap", dec!(30), 20).await;
    let approvals = controller(&h, Arc::new(RecordingSink::default()));

    let input = entry_input(EntryType::Sale, anonymous(), vec![item(soap.id, 2, None)]);
    let entry = h.engine.commit_entry(&h.manager, &input, None).await.unwrap();

    let first = approvals
        .submit_change_request(&h.manager, entry.id, None)
        .await
        .unwrap();
    let err = approvals
        .submit_change_request(&h.other_manager(), entry.id, Some(input))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Ledger(LedgerError::RequestAlreadyPending { request_id, .. })
            if request_id == first.id
    ));
}

#[tokio::test]
async fn test_update_of_settled_entry_is_not_queued() {
    let h = Harness::new();
    let soap = h.product("Soap", dec!(30), 20).await;
    let customer = h.counterparty(CounterpartyKind::Customer, "Omar").await;
    let approvals = controller(&h, Arc::new(RecordingSink::default()));

    let mut input = entry_input(
        EntryType::Sale,
        CounterpartySelection::Existing { id: customer.id },
        vec![item(soap.id, 4, None)],
    );
    input.payment_status = PaymentStatus::Pending;
    input.payment_method = None;
    let entry = h.engine.commit_entry(&h.manager, &input, None).await.unwrap();
    h.engine
        .apply_payment(
            &h.manager,
            &PaymentApplicationInput {
                entity_id: customer.id,
                entry_type: EntryType::Sale,
                amount: dec!(50),
                method: PaymentMethod::Cash,
                date: today(),
                selected_entry_ids: vec![entry.id],
                notes: None,
            },
        )
        .await
        .unwrap();

    let err = approvals
        .submit_change_request(&h.manager, entry.id, Some(input))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Ledger(LedgerError::Validation(ValidationError::SettledEntryNotEditable(_)))
    ));
    assert!(h.read::<PendingRequestIndex>(entry.id).await.is_none());
}

#[tokio::test]
async fn test_rejection_leaves_entry_untouched() {
    let h = Harness::new();
    let soap = h.product("Soap", dec!(30), 20).await;
    let sink = Arc::new(RecordingSink::default());
    let approvals = controller(&h, sink.clone());

    let input = entry_input(EntryType::Sale, anonymous(), vec![item(soap.id, 2, None)]);
    let entry = h.engine.commit_entry(&h.manager, &input, None).await.unwrap();
    let ChangeOutcome::Queued(request) = approvals
        .request_delete(&h.manager, entry.id)
        .await
        .unwrap()
    else {
        panic!("expected a queued delete");
    };
    assert_eq!(request.request_type, RequestType::Delete);

    let resolved = approvals
        .resolve_request(&h.admin, request.id, Decision::Reject, Some("  ".into()))
        .await
        .unwrap();
    assert_eq!(resolved.status, RequestStatus::Rejected);
    assert!(resolved.resolution_note.is_none());
    assert!(h.read::<LedgerEntry>(entry.id).await.is_some());
    assert!(h.read::<PendingRequestIndex>(entry.id).await.is_none());
    assert_eq!(h.stock_of(soap.id).await, 18);
    assert!(sink.titles().contains(&"Change request rejected".to_string()));

    let again = approvals
        .resolve_request(&h.admin, request.id, Decision::Approve, None)
        .await
        .unwrap_err();
    assert!(matches!(
        again,
        WorkflowError::InvalidTransition {
            from: RequestStatus::Rejected,
            to: RequestStatus::Approved,
        }
    ));
}

#[tokio::test]
async fn test_approved_delete_reverses_stock() {
    let h = Harness::new();
    let soap = h.product("Soap", dec!(30), 20).await;
    let approvals = controller(&h, Arc::new(RecordingSink::default()));

    let input = entry_input(EntryType::Sale, anonymous(), vec![item(soap.id, 4, None)]);
    let entry = h.engine.commit_entry(&h.manager, &input, None).await.unwrap();
    let request = approvals
        .submit_change_request(&h.manager, entry.id, None)
        .await
        .unwrap();

    approvals
        .resolve_request(&h.admin, request.id, Decision::Approve, None)
        .await
        .unwrap();

    assert!(h.read::<LedgerEntry>(entry.id).await.is_none());
    assert_eq!(h.stock_of(soap.id).await, 20);
    let trail = h
        .store
        .audit_logs_for(h.admin.company_id, entry.id)
        .await
        .unwrap();
    let actions: Vec<_> = trail.iter().map(|a: &AuditLog| a.action).collect();
    assert!(actions.contains(&AuditAction::EntryDeleted));
    assert!(actions.contains(&AuditAction::RequestApproved));
}

#[tokio::test]
async fn test_stale_update_is_refused() {
    let h = Harness::new();
    let soap = h.product("Soap", dec!(10), 50).await;
    let customer = h.counterparty(CounterpartyKind::Customer, "Zoya").await;
    let approvals = controller(&h, Arc::new(RecordingSink::default()));

    let mut input = entry_input(
        EntryType::Sale,
        CounterpartySelection::Existing { id: customer.id },
        vec![item(soap.id, 10, None)],
    );
    input.payment_status = PaymentStatus::Pending;
    input.payment_method = None;
    let entry = h.engine.commit_entry(&h.manager, &input, None).await.unwrap();

    let request = approvals
        .submit_change_request(&h.other_manager(), entry.id, Some(input.clone()))
        .await
        .unwrap();

    // A settlement lands before the admin looks at the request.
    h.engine
        .apply_payment(
            &h.admin,
            &PaymentApplicationInput {
                entity_id: customer.id,
                entry_type: EntryType::Sale,
                amount: dec!(40),
                method: PaymentMethod::Cash,
                date: today(),
                selected_entry_ids: vec![entry.id],
                notes: None,
            },
        )
        .await
        .unwrap();

    let err = approvals
        .resolve_request(&h.admin, request.id, Decision::Approve, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::StaleRequest { .. }));

    // Nothing was written: the request is still pending.
    let still = h.read::<UpdateRequest>(request.id).await.unwrap();
    assert_eq!(still.status, RequestStatus::Pending);
    assert!(h.read::<PendingRequestIndex>(entry.id).await.is_some());
}

#[tokio::test]
async fn test_deleting_entry_rejects_its_pending_request() {
    let h = Harness::new();
    let soap = h.product("Soap", dec!(30), 20).await;
    let approvals = controller(&h, Arc::new(RecordingSink::default()));

    let input = entry_input(EntryType::Sale, anonymous(), vec![item(soap.id, 1, None)]);
    let entry = h.engine.commit_entry(&h.manager, &input, None).await.unwrap();
    let request = approvals
        .submit_change_request(&h.manager, entry.id, Some(input))
        .await
        .unwrap();

    let outcome = h.engine.delete_entry(&h.admin, entry.id).await.unwrap();
    assert!(matches!(outcome, DeleteOutcome::Deleted { .. }));

    let closed = h.read::<UpdateRequest>(request.id).await.unwrap();
    assert_eq!(closed.status, RequestStatus::Rejected);
    assert_eq!(closed.resolved_by_uid, Some(h.admin.uid));
    assert!(h.read::<PendingRequestIndex>(entry.id).await.is_none());
}

#[tokio::test]
async fn test_store_manager_cannot_resolve() {
    let h = Harness::new();
    let soap = h.product("Soap", dec!(30), 20).await;
    let approvals = controller(&h, Arc::new(RecordingSink::default()));

    let input = entry_input(EntryType::Sale, anonymous(), vec![item(soap.id, 1, None)]);
    let entry = h.engine.commit_entry(&h.manager, &input, None).await.unwrap();
    let request = approvals
        .submit_change_request(&h.manager, entry.id, None)
        .await
        .unwrap();

    let err = approvals
        .resolve_request(&h.manager, request.id, Decision::Approve, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotAuthorizedToResolve { .. }));
    assert!(h.read::<LedgerEntry>(entry.id).await.is_some());
}

#[tokio::test]
async fn test_delivery_failure_does_not_fail_the_request() {
    let h = Harness::new();
    let soap = h.product("Soap", dec!(30), 20).await;
    let approvals = controller(&h, Arc::new(FailingSink));

    let input = entry_input(EntryType::Sale, anonymous(), vec![item(soap.id, 1, None)]);
    let entry = h.engine.commit_entry(&h.manager, &input, None).await.unwrap();

    let request = approvals
        .submit_change_request(&h.manager, entry.id, None)
        .await
        .unwrap();
    let resolved = approvals
        .resolve_request(&h.admin, request.id, Decision::Reject, None)
        .await
        .unwrap();
    assert_eq!(resolved.status, RequestStatus::Rejected);
}

#[tokio::test]
async fn test_missing_entry_delete_is_already_deleted() {
    let h = Harness::new();
    let approvals = controller(&h, Arc::new(RecordingSink::default()));

    let outcome = approvals
        .request_delete(&h.manager, LedgerEntryId::new())
        .await
        .unwrap();
    assert_eq!(outcome, ChangeOutcome::Deleted(DeleteOutcome::AlreadyDeleted));
}
