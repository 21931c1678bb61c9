//! Property-based tests for entry arithmetic and stock movement.
//!
//! - Totals: grand total is subtotal plus tax, every amount has two places
//! - Payment split: paid plus remaining always equals the grand total
//! - Stock: applying then reversing an entry restores every product

use std::collections::BTreeMap;

use khata_shared::types::ProductId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::test_support::line;
use super::totals::{compute_totals, line_total, split_payment};
use super::types::{EntryType, LineItem, PaymentStatus};
use crate::catalog::net_stock_deltas;

/// Unit prices from 0.00 to 99,999.99.
fn arb_price() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_lines() -> impl Strategy<Value = Vec<LineItem>> {
    prop::collection::vec((1u32..1_000, arb_price()), 1..12).prop_map(|lines| {
        lines
            .into_iter()
            .map(|(qty, price)| {
                let mut item = line(ProductId::new(), qty, price);
                item.total_price = line_total(qty, price);
                item
            })
            .collect()
    })
}

fn arb_entry_type() -> impl Strategy<Value = EntryType> {
    prop_oneof![Just(EntryType::Sale), Just(EntryType::Purchase)]
}

fn apply(stock: &mut BTreeMap<ProductId, i64>, deltas: BTreeMap<ProductId, i64>) {
    for (product_id, delta) in deltas {
        *stock.entry(product_id).or_default() += delta;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_totals_are_consistent(items in arb_lines(), gst in any::<bool>()) {
        let totals = compute_totals(&items, gst, Decimal::new(18, 2));
        prop_assert_eq!(totals.grand_total, totals.sub_total + totals.tax_amount);
        prop_assert!(totals.sub_total.scale() <= 2);
        prop_assert!(totals.tax_amount.scale() <= 2);
        if !gst {
            prop_assert_eq!(totals.tax_amount, Decimal::ZERO);
        }
        prop_assert!(totals.tax_amount >= Decimal::ZERO);
    }

    #[test]
    fn prop_split_preserves_grand_total(
        items in arb_lines(),
        gst in any::<bool>(),
        fraction in 1u32..100,
    ) {
        let totals = compute_totals(&items, gst, Decimal::new(18, 2));
        let offered = khata_shared::types::round_money(
            totals.grand_total * Decimal::from(fraction) / Decimal::ONE_HUNDRED,
        );

        for status in [PaymentStatus::Paid, PaymentStatus::Pending, PaymentStatus::Partial] {
            match split_payment(totals.grand_total, status, Some(offered)) {
                Ok(split) => {
                    prop_assert_eq!(split.amount_paid_now + split.remaining_amount, totals.grand_total);
                    prop_assert!(split.amount_paid_now >= Decimal::ZERO);
                    prop_assert!(split.remaining_amount >= Decimal::ZERO);
                    prop_assert_eq!(
                        PaymentStatus::from_amounts(split.amount_paid_now, totals.grand_total)
                            == status,
                        totals.grand_total > Decimal::ZERO || status == PaymentStatus::Paid
                    );
                }
                Err(_) => {
                    // Only a partial outside (0, total) may fail.
                    prop_assert_eq!(status, PaymentStatus::Partial);
                    prop_assert!(offered <= Decimal::ZERO || offered >= totals.grand_total);
                }
            }
        }
    }

    #[test]
    fn prop_reversal_restores_stock(
        items in arb_lines(),
        entry_type in arb_entry_type(),
        opening in 0i64..100_000,
    ) {
        let mut stock: BTreeMap<ProductId, i64> =
            items.iter().map(|i| (i.product_id, opening)).collect();
        let before = stock.clone();

        apply(&mut stock, net_stock_deltas(None, Some((entry_type, &items))));
        apply(&mut stock, net_stock_deltas(Some((entry_type, &items)), None));

        prop_assert_eq!(stock, before);
    }

    #[test]
    fn prop_edit_equals_reverse_then_apply(
        old in arb_lines(),
        new in arb_lines(),
        entry_type in arb_entry_type(),
    ) {
        let mut netted: BTreeMap<ProductId, i64> = BTreeMap::new();
        apply(&mut netted, net_stock_deltas(Some((entry_type, &old)), Some((entry_type, &new))));

        let mut stepwise: BTreeMap<ProductId, i64> = BTreeMap::new();
        apply(&mut stepwise, net_stock_deltas(Some((entry_type, &old)), None));
        apply(&mut stepwise, net_stock_deltas(None, Some((entry_type, &new))));
        stepwise.retain(|_, delta| *delta != 0);

        prop_assert_eq!(netted, stepwise);
    }
}
