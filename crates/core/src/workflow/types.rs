//! Approval workflow types.

use chrono::{DateTime, Utc};
use khata_shared::types::{CompanyId, LedgerEntryId, UpdateRequestId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::{DeleteOutcome, LedgerEntry, LedgerEntryInput};

/// What a change request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    /// Replace the entry with `updated_data`.
    Update,
    /// Delete the entry.
    Delete,
}

impl RequestType {
    /// Returns the string representation of the request type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request status.
///
/// The only transitions are Pending → Approved and Pending → Rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Waiting for an admin.
    Pending,
    /// Applied.
    Approved,
    /// Discarded.
    Rejected,
}

impl RequestStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true once the request can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An admin's answer to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Apply the requested change.
    Approve,
    /// Discard it.
    Reject,
}

impl Decision {
    /// Status a pending request moves to.
    #[must_use]
    pub fn target_status(&self) -> RequestStatus {
        match self {
            Self::Approve => RequestStatus::Approved,
            Self::Reject => RequestStatus::Rejected,
        }
    }
}

/// A queued edit or delete of a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// Request id.
    pub id: UpdateRequestId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Update or delete.
    pub request_type: RequestType,
    /// Entry the request targets.
    pub original_ledger_entry_id: LedgerEntryId,
    /// Entry as it was when the request was made.
    pub original_data: LedgerEntry,
    /// Proposed replacement, for updates.
    pub updated_data: Option<LedgerEntryInput>,
    /// Requesting user.
    pub requested_by_uid: UserId,
    /// Requesting user's display name.
    pub requested_by_name: String,
    /// Current status.
    pub status: RequestStatus,
    /// Resolving admin.
    pub resolved_by_uid: Option<UserId>,
    /// Resolving admin's display name.
    pub resolved_by_name: Option<String>,
    /// Admin's note.
    pub resolution_note: Option<String>,
    /// When the request was made.
    pub created_at: DateTime<Utc>,
    /// When it was resolved.
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Marker keyed by entry id: at most one pending request per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestIndex {
    /// Entry with a pending request.
    pub entry_id: LedgerEntryId,
    /// The pending request.
    pub request_id: UpdateRequestId,
    /// Owning company.
    pub company_id: CompanyId,
}

/// Result of asking to change an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// The actor could edit directly; the new entry.
    Applied(LedgerEntry),
    /// The actor could delete directly.
    Deleted(DeleteOutcome),
    /// Queued for an admin.
    Queued(UpdateRequest),
}

/// Resolution of a pending request, with audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTransition {
    /// Status after resolution.
    pub new_status: RequestStatus,
    /// Resolving admin.
    pub resolved_by: UserId,
    /// When it was resolved.
    pub resolved_at: DateTime<Utc>,
}
