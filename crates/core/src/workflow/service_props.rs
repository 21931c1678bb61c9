//! Property-based tests for the request state machine.

use khata_shared::types::{CompanyId, UserId};
use proptest::prelude::*;

use crate::actor::{ActorContext, ActorRole};
use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{Decision, RequestStatus};

fn arb_status() -> impl Strategy<Value = RequestStatus> {
    prop_oneof![
        Just(RequestStatus::Pending),
        Just(RequestStatus::Approved),
        Just(RequestStatus::Rejected),
    ]
}

fn arb_decision() -> impl Strategy<Value = Decision> {
    prop_oneof![Just(Decision::Approve), Just(Decision::Reject)]
}

fn arb_role() -> impl Strategy<Value = ActorRole> {
    prop_oneof![Just(ActorRole::Admin), Just(ActorRole::StoreManager)]
}

fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(uuid::Uuid::from_u128(n)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Resolution succeeds exactly for privileged actors on pending requests.
    #[test]
    fn prop_only_admins_resolve_pending(
        status in arb_status(),
        decision in arb_decision(),
        role in arb_role(),
        uid in arb_user(),
    ) {
        let actor = ActorContext::new(uid, "Someone", role, CompanyId::new());
        let result = WorkflowService::resolve(status, decision, &actor);

        match (role, status) {
            (ActorRole::Admin, RequestStatus::Pending) => {
                let t = result.unwrap();
                prop_assert_eq!(t.new_status, decision.target_status());
                prop_assert_eq!(t.resolved_by, uid);
            }
            (ActorRole::StoreManager, _) => {
                let is_unauthorized = matches!(
                    result,
                    Err(WorkflowError::NotAuthorizedToResolve { .. })
                );
                prop_assert!(is_unauthorized);
            }
            (ActorRole::Admin, _) => {
                let is_invalid = matches!(
                    result,
                    Err(WorkflowError::InvalidTransition { from, .. }) if from == status
                );
                prop_assert!(is_invalid);
            }
        }
    }

    /// A resolved request is terminal under any decision.
    #[test]
    fn prop_resolved_is_terminal(
        status in arb_status(),
        first in arb_decision(),
        second in arb_decision(),
    ) {
        let admin = ActorContext::new(UserId::new(), "Admin", ActorRole::Admin, CompanyId::new());
        if let Ok(t) = WorkflowService::resolve(status, first, &admin) {
            prop_assert!(t.new_status.is_terminal());
            prop_assert!(WorkflowService::resolve(t.new_status, second, &admin).is_err());
        } else {
            prop_assert!(status.is_terminal());
        }
    }
}
