//! Listing filters and the visibility rule.

use serde::{Deserialize, Serialize};

use crate::actor::ActorContext;
use crate::ledger::{EntityType, EntryType, LedgerEntry};

/// Entity-type tab of the daily listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityTab {
    /// Everything.
    #[default]
    All,
    /// Directory customers.
    Customer,
    /// Directory sellers.
    Seller,
    /// Walk-in customers.
    UnknownCustomer,
    /// Anonymous sellers.
    UnknownSeller,
}

impl EntityTab {
    /// Returns true if entries of `entity_type` belong on this tab.
    #[must_use]
    pub fn includes(&self, entity_type: EntityType) -> bool {
        match self {
            Self::All => true,
            Self::Customer => entity_type == EntityType::Customer,
            Self::Seller => entity_type == EntityType::Seller,
            Self::UnknownCustomer => entity_type == EntityType::UnknownCustomer,
            Self::UnknownSeller => entity_type == EntityType::UnknownSeller,
        }
    }
}

/// Tab plus free-text search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Entity-type tab.
    #[serde(default)]
    pub tab: EntityTab,
    /// Case-insensitive search over entity name, item names, notes and
    /// payment method.
    pub search: Option<String>,
}

impl EntryFilter {
    /// Returns true if `entry` passes the tab and the search.
    #[must_use]
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        if !self.tab.includes(entry.entity_type) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => matches_search(entry, &needle.to_lowercase()),
        }
    }
}

fn matches_search(entry: &LedgerEntry, needle: &str) -> bool {
    let hit = |text: &str| text.to_lowercase().contains(needle);

    hit(&entry.entity_name)
        || entry.items.iter().any(|item| hit(&item.product_name))
        || entry.notes.as_deref().is_some_and(hit)
        || entry.payment_method.is_some_and(|m| hit(m.label()))
}

/// The listing visibility rule.
///
/// Admins see everything of their company. Store managers see every sale
/// but only the purchases they created.
#[must_use]
pub fn is_visible_to(viewer: &ActorContext, entry: &LedgerEntry) -> bool {
    entry.company_id == viewer.company_id
        && (viewer.is_privileged()
            || entry.entry_type == EntryType::Sale
            || entry.created_by_uid == viewer.uid)
}
