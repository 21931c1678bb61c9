//! Counterparty types.

use chrono::{DateTime, Utc};
use khata_shared::types::{CompanyId, CounterpartyId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a counterparty buys from or sells to the business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterpartyKind {
    /// Buys from us (sales).
    Customer,
    /// Sells to us (purchases).
    Seller,
}

impl CounterpartyKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Seller => "seller",
        }
    }
}

impl fmt::Display for CounterpartyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer or seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counterparty {
    /// Counterparty id.
    pub id: CounterpartyId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Customer or seller.
    pub kind: CounterpartyKind,
    /// Display name.
    pub name: String,
    /// Contact phone, if known.
    pub phone: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Counterparty {
    /// Builds a new counterparty with trimmed fields.
    #[must_use]
    pub fn new(
        company_id: CompanyId,
        kind: CounterpartyKind,
        name: &str,
        phone: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CounterpartyId::new(),
            company_id,
            kind,
            name: name.trim().to_string(),
            phone: phone.map(str::trim).filter(|p| !p.is_empty()).map(str::to_string),
            created_at: now,
        }
    }
}

/// Input for creating a counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCounterparty {
    /// Customer or seller.
    pub kind: CounterpartyKind,
    /// Display name.
    pub name: String,
    /// Contact phone.
    pub phone: Option<String>,
}
