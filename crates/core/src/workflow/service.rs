//! Request state machine.

use chrono::Utc;

use crate::actor::ActorContext;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{Decision, RequestStatus, RequestTransition};

/// Stateless service validating request transitions.
pub struct WorkflowService;

impl WorkflowService {
    /// Resolves a request currently in `current` with `decision`.
    ///
    /// # Returns
    /// * `Ok(RequestTransition)` if `actor` is privileged and the request is pending
    /// * `Err(WorkflowError::NotAuthorizedToResolve)` for non-privileged actors
    /// * `Err(WorkflowError::InvalidTransition)` if the request is already resolved
    pub fn resolve(
        current: RequestStatus,
        decision: Decision,
        actor: &ActorContext,
    ) -> Result<RequestTransition, WorkflowError> {
        if !actor.is_privileged() {
            return Err(WorkflowError::NotAuthorizedToResolve { user_id: actor.uid });
        }

        let target = decision.target_status();
        match current {
            RequestStatus::Pending => Ok(RequestTransition {
                new_status: target,
                resolved_by: actor.uid,
                resolved_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current,
                to: target,
            }),
        }
    }
}
