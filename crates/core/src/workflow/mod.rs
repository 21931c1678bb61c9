//! Approval workflow for ledger changes.
//!
//! # Modules
//!
//! - `types` - Request, status and outcome types
//! - `error` - Workflow-specific error types
//! - `service` - Request state machine
//! - `approval` - Routing of edits and deletes, request submission and resolution

pub mod approval;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod tests;

pub use approval::ApprovalController;
pub use error::WorkflowError;
pub use service::WorkflowService;
pub use types::{
    ChangeOutcome, Decision, PendingRequestIndex, RequestStatus, RequestTransition, RequestType,
    UpdateRequest,
};
