//! Property-based tests for entry and payment input validation.

use chrono::NaiveDate;
use khata_shared::types::{CounterpartyId, LedgerEntryId, ProductId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::ValidationError;
use super::types::{
    CounterpartySelection, EntryType, LedgerEntryInput, LineItemInput, PaymentApplicationInput,
    PaymentMethod, PaymentStatus,
};
use super::validation::{validate_entry_input, validate_payment_input};

fn arb_status() -> impl Strategy<Value = PaymentStatus> {
    prop_oneof![
        Just(PaymentStatus::Paid),
        Just(PaymentStatus::Pending),
        Just(PaymentStatus::Partial),
    ]
}

fn arb_price() -> impl Strategy<Value = Option<Decimal>> {
    prop_oneof![
        Just(None),
        (0i64..10_000_000i64).prop_map(|cents| Some(Decimal::new(cents, 2))),
    ]
}

fn arb_line() -> impl Strategy<Value = LineItemInput> {
    (1u32..500, arb_price()).prop_map(|(quantity, unit_price)| LineItemInput {
        product_id: ProductId::new(),
        quantity,
        unit_price,
    })
}

fn entry_input(items: Vec<LineItemInput>, status: PaymentStatus) -> LedgerEntryInput {
    LedgerEntryInput {
        date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        entry_type: EntryType::Purchase,
        counterparty: CounterpartySelection::Anonymous { name: None },
        items,
        apply_gst: true,
        payment_status: status,
        payment_method: Some(PaymentMethod::BankTransfer),
        amount_paid_now: None,
        notes: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Well-formed lines with a payment method always pass.
    #[test]
    fn prop_well_formed_input_passes(
        items in prop::collection::vec(arb_line(), 1..10),
        status in arb_status(),
    ) {
        prop_assert!(validate_entry_input(&entry_input(items, status)).is_ok());
    }

    /// Any zero-quantity line is rejected, naming that line's product.
    #[test]
    fn prop_zero_quantity_rejected(
        mut items in prop::collection::vec(arb_line(), 1..10),
        index in any::<prop::sample::Index>(),
    ) {
        let at = index.index(items.len());
        items[at].quantity = 0;
        let product_id = items[at].product_id;
        let first_bad = items.iter().position(|i| i.quantity == 0).unwrap();
        prop_assert_eq!(first_bad, at);
        prop_assert_eq!(
            validate_entry_input(&entry_input(items, PaymentStatus::Paid)),
            Err(ValidationError::NonPositiveQuantity(product_id))
        );
    }

    /// Negative prices are rejected; zero is a valid price.
    #[test]
    fn prop_negative_price_rejected(cents in 1i64..10_000_000i64) {
        let mut items = vec![LineItemInput {
            product_id: ProductId::new(),
            quantity: 1,
            unit_price: Some(Decimal::new(-cents, 2)),
        }];
        prop_assert!(matches!(
            validate_entry_input(&entry_input(items.clone(), PaymentStatus::Pending)),
            Err(ValidationError::NegativeUnitPrice(_))
        ));
        items[0].unit_price = Some(Decimal::ZERO);
        prop_assert!(validate_entry_input(&entry_input(items, PaymentStatus::Pending)).is_ok());
    }

    /// Only pending entries may omit the payment method.
    #[test]
    fn prop_method_required_unless_pending(
        items in prop::collection::vec(arb_line(), 1..5),
        status in arb_status(),
    ) {
        let mut input = entry_input(items, status);
        input.payment_method = None;
        let result = validate_entry_input(&input);
        if status == PaymentStatus::Pending {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result, Err(ValidationError::PaymentMethodRequired));
        }
    }

    /// Non-positive payment amounts never pass.
    #[test]
    fn prop_non_positive_payment_rejected(cents in -10_000_000i64..=0i64) {
        let input = PaymentApplicationInput {
            entity_id: CounterpartyId::new(),
            entry_type: EntryType::Sale,
            amount: Decimal::new(cents, 2),
            method: PaymentMethod::Cash,
            date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            selected_entry_ids: vec![LedgerEntryId::new()],
            notes: None,
        };
        prop_assert_eq!(
            validate_payment_input(&input),
            Err(ValidationError::NonPositivePayment)
        );
    }
}
