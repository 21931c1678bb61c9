//! Typed IDs for type-safe record references.
//!
//! Using typed IDs prevents accidentally passing a `ProductId` where a `LedgerEntryId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a staff user (an actor).");
typed_id!(CompanyId, "Unique identifier for the company a record is scoped to.");
typed_id!(
    CounterpartyId,
    "Unique identifier for a customer or seller in the entity directory."
);
typed_id!(ProductId, "Unique identifier for a catalog product.");
typed_id!(LedgerEntryId, "Unique identifier for a ledger entry.");
typed_id!(PaymentRecordId, "Unique identifier for a payment record.");
typed_id!(UpdateRequestId, "Unique identifier for an approval-workflow request.");
typed_id!(AuditLogId, "Unique identifier for an audit log record.");
