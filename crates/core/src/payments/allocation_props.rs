//! Property-based tests for settlement allocation.

use khata_shared::types::LedgerEntryId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::payments::allocation::{OutstandingBalance, allocate};

/// Strategy for non-negative amounts with two decimal places.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_balances() -> impl Strategy<Value = Vec<OutstandingBalance>> {
    prop::collection::vec(arb_amount(), 1..8).prop_map(|amounts| {
        amounts
            .into_iter()
            .map(|remaining| OutstandingBalance {
                ledger_entry_id: LedgerEntryId::new(),
                remaining,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Applied plus unapplied always equals the payment.
    #[test]
    fn prop_payment_is_conserved(amount in arb_amount(), balances in arb_balances()) {
        let allocation = allocate(amount, &balances);
        prop_assert_eq!(allocation.total_applied() + allocation.unapplied, amount);
    }

    /// No entry receives more than its remaining balance.
    #[test]
    fn prop_never_overpays_an_entry(amount in arb_amount(), balances in arb_balances()) {
        let allocation = allocate(amount, &balances);
        for application in &allocation.applications {
            let balance = balances
                .iter()
                .find(|b| b.ledger_entry_id == application.ledger_entry_id)
                .unwrap();
            prop_assert!(application.amount > Decimal::ZERO);
            prop_assert!(application.amount <= balance.remaining);
        }
    }

    /// The applied total is the smaller of the payment and the open balance.
    #[test]
    fn prop_applies_min_of_payment_and_outstanding(
        amount in arb_amount(),
        balances in arb_balances(),
    ) {
        let outstanding: Decimal = balances.iter().map(|b| b.remaining).sum();
        let allocation = allocate(amount, &balances);
        prop_assert_eq!(allocation.total_applied(), amount.min(outstanding));
    }

    /// Earlier entries are fully settled before a later one receives anything.
    #[test]
    fn prop_fills_in_order(amount in arb_amount(), balances in arb_balances()) {
        let allocation = allocate(amount, &balances);
        let positions: Vec<usize> = allocation
            .applications
            .iter()
            .map(|a| balances.iter().position(|b| b.ledger_entry_id == a.ledger_entry_id).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));

        if let Some(last) = positions.last() {
            for balance in &balances[..*last] {
                let applied = allocation
                    .applications
                    .iter()
                    .find(|a| a.ledger_entry_id == balance.ledger_entry_id)
                    .map_or(Decimal::ZERO, |a| a.amount);
                prop_assert_eq!(applied, balance.remaining);
            }
        }
    }
}
