//! Settlement allocation.
//!
//! A payment is spread over the selected entries in the order the caller
//! listed them: each entry takes `min(left to apply, its remaining balance)`
//! until the payment or the list runs out.

use khata_shared::types::LedgerEntryId;
use rust_decimal::Decimal;

use super::types::PaymentApplication;

/// An entry's open balance offered for settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutstandingBalance {
    /// The entry.
    pub ledger_entry_id: LedgerEntryId,
    /// Its remaining amount.
    pub remaining: Decimal,
}

/// Result of spreading a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Non-zero amounts applied, in caller order.
    pub applications: Vec<PaymentApplication>,
    /// Part of the payment no entry could absorb.
    pub unapplied: Decimal,
}

impl Allocation {
    /// Returns the sum applied across entries.
    #[must_use]
    pub fn total_applied(&self) -> Decimal {
        self.applications.iter().map(|a| a.amount).sum()
    }
}

/// Spreads `amount` over `outstanding` in order.
#[must_use]
pub fn allocate(amount: Decimal, outstanding: &[OutstandingBalance]) -> Allocation {
    let mut left = amount.max(Decimal::ZERO);
    let mut applications = Vec::new();

    for balance in outstanding {
        if left.is_zero() {
            break;
        }
        let applied = left.min(balance.remaining.max(Decimal::ZERO));
        if applied.is_zero() {
            continue;
        }
        applications.push(PaymentApplication {
            ledger_entry_id: balance.ledger_entry_id,
            amount: applied,
        });
        left -= applied;
    }

    Allocation {
        applications,
        unapplied: left,
    }
}
