//! Stock movement arithmetic.
//!
//! A sale removes goods, a purchase adds them. Editing an entry reverses the
//! old lines and applies the new ones, netted per product so a product that
//! appears on both sides is written once.

use std::collections::BTreeMap;

use khata_shared::types::ProductId;

use crate::ledger::{EntryType, LineItem};

/// Returns the signed stock change of `quantity` units moved by `entry_type`.
#[must_use]
pub fn signed_quantity(entry_type: EntryType, quantity: u32) -> i64 {
    match entry_type {
        EntryType::Sale => -i64::from(quantity),
        EntryType::Purchase => i64::from(quantity),
    }
}

/// Nets the reversal of `reverse` and the application of `apply` per product.
///
/// Products whose net change is zero are omitted.
#[must_use]
pub fn net_stock_deltas(
    reverse: Option<(EntryType, &[LineItem])>,
    apply: Option<(EntryType, &[LineItem])>,
) -> BTreeMap<ProductId, i64> {
    let mut deltas: BTreeMap<ProductId, i64> = BTreeMap::new();

    if let Some((entry_type, items)) = reverse {
        for item in items {
            *deltas.entry(item.product_id).or_default() -=
                signed_quantity(entry_type, item.quantity);
        }
    }
    if let Some((entry_type, items)) = apply {
        for item in items {
            *deltas.entry(item.product_id).or_default() +=
                signed_quantity(entry_type, item.quantity);
        }
    }

    deltas.retain(|_, delta| *delta != 0);
    deltas
}

/// Returns the stock after applying `delta`, or `None` if it would go negative.
#[must_use]
pub fn checked_stock(current: i64, delta: i64) -> Option<i64> {
    current.checked_add(delta).filter(|stock| *stock >= 0)
}
