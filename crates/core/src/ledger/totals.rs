//! Totals, tax and balance arithmetic.
//!
//! Every stored amount is rounded to two places with banker's rounding.
//! `grand_total = sub_total + tax_amount` and
//! `amount_paid_now + remaining_amount = grand_total` hold by construction.

use khata_shared::types::round_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::types::{LineItem, PaymentStatus};

/// Derived monetary fields of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Sum of line totals.
    pub sub_total: Decimal,
    /// GST on the subtotal.
    pub tax_amount: Decimal,
    /// Subtotal plus tax.
    pub grand_total: Decimal,
}

/// Paid and remaining parts of a grand total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSplit {
    /// Money received or paid now.
    pub amount_paid_now: Decimal,
    /// Money still owed.
    pub remaining_amount: Decimal,
}

/// Returns the rounded total of one line.
#[must_use]
pub fn line_total(quantity: u32, unit_price: Decimal) -> Decimal {
    round_money(Decimal::from(quantity) * unit_price)
}

/// Computes subtotal, tax and grand total for `items`.
#[must_use]
pub fn compute_totals(items: &[LineItem], apply_gst: bool, tax_rate: Decimal) -> EntryTotals {
    let sub_total = round_money(items.iter().map(|item| item.total_price).sum());
    let tax_amount = if apply_gst {
        round_money(sub_total * tax_rate)
    } else {
        Decimal::ZERO
    };
    EntryTotals {
        sub_total,
        tax_amount,
        grand_total: sub_total + tax_amount,
    }
}

/// Splits `grand_total` according to the requested payment status.
///
/// `paid` pays everything, `pending` pays nothing, `partial` pays
/// `requested`, which must lie strictly between zero and the total.
pub fn split_payment(
    grand_total: Decimal,
    status: PaymentStatus,
    requested: Option<Decimal>,
) -> Result<PaymentSplit, ValidationError> {
    let amount_paid_now = match status {
        PaymentStatus::Paid => grand_total,
        PaymentStatus::Pending => Decimal::ZERO,
        PaymentStatus::Partial => {
            let amount_paid = round_money(requested.unwrap_or(Decimal::ZERO));
            if amount_paid <= Decimal::ZERO || amount_paid >= grand_total {
                return Err(ValidationError::PartialAmountOutOfRange {
                    amount_paid,
                    grand_total,
                });
            }
            amount_paid
        }
    };
    Ok(PaymentSplit {
        amount_paid_now,
        remaining_amount: grand_total - amount_paid_now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::test_support::line;
    use khata_shared::types::ProductId;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sale_without_gst() {
        let items = vec![line(ProductId::new(), 5, dec!(100))];
        let totals = compute_totals(&items, false, dec!(0.18));
        assert_eq!(totals.sub_total, dec!(500));
        assert_eq!(totals.tax_amount, dec!(0));
        assert_eq!(totals.grand_total, dec!(500));
    }

    #[test]
    fn test_gst_applied() {
        let items = vec![
            line(ProductId::new(), 2, dec!(250)),
            line(ProductId::new(), 1, dec!(99.99)),
        ];
        let totals = compute_totals(&items, true, dec!(0.18));
        assert_eq!(totals.sub_total, dec!(599.99));
        // 599.99 * 0.18 = 107.9982
        assert_eq!(totals.tax_amount, dec!(108.00));
        assert_eq!(totals.grand_total, dec!(707.99));
    }

    #[test]
    fn test_line_total_rounds_half_even() {
        assert_eq!(line_total(1, dec!(10.125)), dec!(10.12));
        assert_eq!(line_total(1, dec!(10.135)), dec!(10.14));
        assert_eq!(line_total(3, dec!(33.335)), dec!(100.00));
    }

    #[test]
    fn test_split_paid_and_pending() {
        let paid = split_payment(dec!(500), PaymentStatus::Paid, Some(dec!(1))).unwrap();
        assert_eq!(paid.amount_paid_now, dec!(500));
        assert_eq!(paid.remaining_amount, dec!(0));

        let pending = split_payment(dec!(500), PaymentStatus::Pending, None).unwrap();
        assert_eq!(pending.amount_paid_now, dec!(0));
        assert_eq!(pending.remaining_amount, dec!(500));
    }

    #[test]
    fn test_split_partial() {
        let split = split_payment(dec!(1000), PaymentStatus::Partial, Some(dec!(400))).unwrap();
        assert_eq!(split.amount_paid_now, dec!(400));
        assert_eq!(split.remaining_amount, dec!(600));
    }

    #[test]
    fn test_split_partial_out_of_range() {
        for bad in [None, Some(dec!(0)), Some(dec!(-5)), Some(dec!(1000)), Some(dec!(1500))] {
            assert!(matches!(
                split_payment(dec!(1000), PaymentStatus::Partial, bad),
                Err(ValidationError::PartialAmountOutOfRange { .. })
            ));
        }
    }
}
