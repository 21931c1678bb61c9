//! The acting user, passed explicitly into every engine call.

use khata_shared::types::{CompanyId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::{LedgerEntry, PaymentStatus};

/// Role of a staff user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// May mutate ledger data directly and resolve approval requests.
    Admin,
    /// May create entries; edits and deletes of other people's or settled
    /// entries go through the approval workflow.
    StoreManager,
}

impl ActorRole {
    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::StoreManager => "store_manager",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "store_manager" => Some(Self::StoreManager),
            _ => None,
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who is acting, and for which company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    /// Acting user.
    pub uid: UserId,
    /// Display name stamped into audit fields.
    pub display_name: String,
    /// Role of the acting user.
    pub role: ActorRole,
    /// Company every read and write is scoped to.
    pub company_id: CompanyId,
}

impl ActorContext {
    /// Creates an actor context.
    #[must_use]
    pub fn new(
        uid: UserId,
        display_name: impl Into<String>,
        role: ActorRole,
        company_id: CompanyId,
    ) -> Self {
        Self {
            uid,
            display_name: display_name.into(),
            role,
            company_id,
        }
    }

    /// Returns true for roles that bypass the approval workflow.
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        matches!(self.role, ActorRole::Admin)
    }

    /// Returns true if this actor may edit or delete `entry` without approval.
    ///
    /// Store managers may only touch their own entries that are not yet fully
    /// paid.
    #[must_use]
    pub fn may_mutate_directly(&self, entry: &LedgerEntry) -> bool {
        if entry.company_id != self.company_id {
            return false;
        }
        self.is_privileged()
            || (entry.created_by_uid == self.uid && entry.payment_status != PaymentStatus::Paid)
    }
}
